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

//! Serialization tests covering both the update-sketch image (full hash
//! table array, always preLongs = 3) and the compact-sketch images (the
//! size-optimized empty/single-item/heap encodings).

use datasketches::theta::{CompactThetaSketch, ThetaSketch, ThetaSketchView};

#[test]
fn test_update_sketch_serializes_full_array() {
    let mut sketch = ThetaSketch::builder().lg_k(5).build();
    sketch.update_str("apple").unwrap();

    let bytes = sketch.serialize();
    assert_eq!(bytes[1], 3, "serVer should be 3");
    assert_eq!(bytes[2], 2, "familyID should be 2 (QuickSelect)");
    assert_eq!(bytes[3], 5, "lgNomLongs should be 5");

    let restored = ThetaSketch::deserialize(&bytes).unwrap();
    assert!(!restored.is_empty());
    assert_eq!(restored.estimate(), sketch.estimate());
    assert_eq!(restored.lg_k(), 5);
}

#[test]
fn test_update_sketch_round_trip_preserves_theta_and_count() {
    let mut sketch = ThetaSketch::builder().lg_k(10).build();
    for i in 0..10_000u64 {
        sketch.update_u64(i).unwrap();
    }
    assert!(sketch.is_estimation_mode());

    let bytes = sketch.serialize();
    let restored = ThetaSketch::deserialize(&bytes).unwrap();

    assert_eq!(restored.theta_long(), sketch.theta_long());
    assert_eq!(restored.retained_entries(true), sketch.retained_entries(true));
    assert!(restored.is_estimation_mode());
}

#[test]
fn test_update_sketch_deserialize_rejects_short_input() {
    let result = ThetaSketch::deserialize(&[1, 2, 3]);
    assert!(result.is_err());
}

#[test]
fn test_update_sketch_deserialize_rejects_wrong_family() {
    let mut bytes = vec![0u8; 24];
    bytes[1] = 3; // serVer
    bytes[2] = 99; // bogus family
    bytes[4] = 5; // lgArrLongs
    let result = ThetaSketch::deserialize(&bytes);
    assert!(result.is_err());
}

#[test]
fn test_update_sketch_serialize_with_custom_seed() {
    let custom_seed = 12345u64;
    let mut sketch = ThetaSketch::builder().lg_k(10).seed(custom_seed).build();
    sketch.update_str("test").unwrap();

    let bytes = sketch.serialize();

    assert!(ThetaSketch::deserialize(&bytes).is_err());
    let restored = ThetaSketch::deserialize_with_seed(&bytes, custom_seed).unwrap();
    assert_eq!(restored.estimate(), sketch.estimate());
}

#[test]
fn test_compact_empty_is_canonical_eight_bytes() {
    let sketch = ThetaSketch::builder().lg_k(12).build();
    let compact = sketch.compact(true);
    let bytes = compact.serialize();

    assert_eq!(bytes.len(), 8);
    assert_eq!(bytes[0], 1, "preLongs should be 1 for empty");
    assert_eq!(bytes[2], 3, "familyID should be 3 (Compact)");

    let restored = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.estimate(), 0.0);
}

#[test]
fn test_compact_single_item_is_sixteen_bytes() {
    let mut sketch = ThetaSketch::builder().lg_k(12).build();
    sketch.update_str("apple").unwrap();

    let bytes = sketch.compact(true).serialize();
    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[0], 1, "preLongs should be 1 for single-item");

    let restored = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert!(restored.is_single_item());
    assert_eq!(restored.num_retained(), 1);
}

#[test]
fn test_compact_exact_mode_size_matches_entry_count() {
    let mut sketch = ThetaSketch::builder().lg_k(12).build();
    for i in 0..100u64 {
        sketch.update_u64(i).unwrap();
    }
    assert!(!sketch.is_estimation_mode());

    let bytes = sketch.compact(true).serialize();
    assert_eq!(bytes.len(), 24 + 100 * 8);
    assert_eq!(bytes[0], 3, "preLongs is always 3 for non-trivial compact images");

    let restored = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored.estimate(), sketch.estimate());
    assert_eq!(restored.num_retained(), 100);
}

#[test]
fn test_compact_estimation_mode_round_trip() {
    let mut sketch = ThetaSketch::builder().lg_k(10).build();
    for i in 0..10_000u64 {
        sketch.update_u64(i).unwrap();
    }
    assert!(sketch.is_estimation_mode());

    let compact = sketch.compact(true);
    let bytes = compact.serialize();
    let expected_size = 24 + compact.num_retained() * 8;
    assert_eq!(bytes.len(), expected_size);

    let restored = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored.num_retained(), compact.num_retained());
    assert!((restored.estimate() - compact.estimate()).abs() < 1.0);
    assert!(restored.is_estimation_mode());
}

#[test]
fn test_compact_round_trip_various_lg_k() {
    for lg_k in [5u8, 8, 10, 12, 14, 16] {
        let mut sketch = ThetaSketch::builder().lg_k(lg_k).build();
        for i in 0..500u64 {
            sketch.update_u64(i).unwrap();
        }

        let bytes = sketch.compact(true).serialize();
        let restored = CompactThetaSketch::deserialize(&bytes).unwrap();

        assert_eq!(
            restored.estimate(),
            sketch.estimate(),
            "estimate mismatch for lg_k={lg_k}"
        );
        assert_eq!(
            restored.num_retained(),
            sketch.retained_entries(true),
            "retained count mismatch for lg_k={lg_k}"
        );
    }
}

#[test]
fn test_compact_serialized_entries_are_sorted_when_ordered() {
    let mut sketch = ThetaSketch::builder().lg_k(12).build();
    for i in 0..10u64 {
        sketch.update_u64(i).unwrap();
    }

    let bytes = sketch.compact(true).serialize();
    let data_start = 24;
    let mut entries = Vec::new();
    let mut offset = data_start;
    while offset + 8 <= bytes.len() {
        entries.push(u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap()));
        offset += 8;
    }

    let mut sorted = entries.clone();
    sorted.sort();
    assert_eq!(entries, sorted);
}

#[test]
fn test_compact_compressed_round_trip() {
    let mut sketch = ThetaSketch::builder().lg_k(10).build();
    for i in 0..2000u64 {
        sketch.update_u64(i).unwrap();
    }

    let compact = sketch.compact(true);
    let compressed = compact.serialize_compressed();
    assert!(compressed.len() < compact.serialize().len());

    let restored = CompactThetaSketch::deserialize(&compressed).unwrap();
    assert_eq!(restored.num_retained(), compact.num_retained());
    let mut expected: Vec<u64> = compact.iter_hashes().collect();
    expected.sort_unstable();
    assert_eq!(restored.iter_hashes().collect::<Vec<_>>(), expected);
}
