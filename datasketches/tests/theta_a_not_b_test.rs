// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use datasketches::theta::{a_not_b, ThetaANotB, ThetaSketch, ThetaSketchView};

fn sketch_with_range(start: u64, count: u64) -> ThetaSketch {
    let mut sketch = ThetaSketch::builder().build();
    for i in 0..count {
        sketch.update_u64(start + i).unwrap();
    }
    sketch
}

#[test]
fn test_a_not_b_of_self_is_empty() {
    let a = sketch_with_range(0, 500);
    let result = a_not_b(&a, &a, datasketches::theta::DEFAULT_UPDATE_SEED, true).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_a_not_b_with_empty_b_returns_a() {
    let a = sketch_with_range(0, 200);
    let empty = ThetaSketch::builder().build();
    let result = a_not_b(&a, &empty, datasketches::theta::DEFAULT_UPDATE_SEED, true).unwrap();
    assert_eq!(result.num_retained(), a.retained_entries(true));
}

#[test]
fn test_a_not_b_with_empty_a_is_empty() {
    let empty = ThetaSketch::builder().build();
    let b = sketch_with_range(0, 200);
    let result = a_not_b(&empty, &b, datasketches::theta::DEFAULT_UPDATE_SEED, true).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_a_not_b_disjoint_sets_returns_all_of_a() {
    let a = sketch_with_range(0, 100);
    let b = sketch_with_range(100, 100);
    let result = a_not_b(&a, &b, datasketches::theta::DEFAULT_UPDATE_SEED, true).unwrap();
    assert_eq!(result.estimate(), 100.0);
}

#[test]
fn test_a_not_b_half_overlap_exact() {
    let a = sketch_with_range(0, 100);
    let b = sketch_with_range(50, 100);
    let result = a_not_b(&a, &b, datasketches::theta::DEFAULT_UPDATE_SEED, true).unwrap();
    assert!(!result.is_estimation_mode());
    assert_eq!(result.estimate(), 50.0);
}

#[test]
fn test_a_not_b_is_not_symmetric() {
    let a = sketch_with_range(0, 100);
    let b = sketch_with_range(50, 100);
    let a_minus_b = a_not_b(&a, &b, datasketches::theta::DEFAULT_UPDATE_SEED, true).unwrap();
    let b_minus_a = a_not_b(&b, &a, datasketches::theta::DEFAULT_UPDATE_SEED, true).unwrap();
    assert_eq!(a_minus_b.estimate(), b_minus_a.estimate());
    assert_ne!(
        a_minus_b.iter_hashes().collect::<Vec<_>>(),
        b_minus_a.iter_hashes().collect::<Vec<_>>()
    );
}

#[test]
fn test_stateful_a_not_b_chains_multiple_subtrahends() {
    let a = sketch_with_range(0, 300);
    let b1 = sketch_with_range(0, 100);
    let b2 = sketch_with_range(200, 100);

    let mut op = ThetaANotB::with_default_seed();
    op.set_a(&a).unwrap();
    op.not_b(&b1).unwrap();
    op.not_b(&b2).unwrap();
    let result = op.get_result(true).unwrap();

    assert_eq!(result.estimate(), 100.0);
}

#[test]
fn test_get_result_before_set_a_is_an_error() {
    let op = ThetaANotB::with_default_seed();
    assert!(op.get_result(true).is_err());
}

#[test]
fn test_a_not_b_rejects_seed_mismatch() {
    let a = sketch_with_range(0, 10);
    let mut b = ThetaSketch::builder().seed(99).build();
    b.update_u64(1).unwrap();

    let result = a_not_b(&a, &b, datasketches::theta::DEFAULT_UPDATE_SEED, true);
    assert!(result.is_err());
}
