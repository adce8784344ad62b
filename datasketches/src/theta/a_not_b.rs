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

//! The A-not-B set operation: everything in A that is not also in B.
//!
//! Unlike [`ThetaUnion`](super::ThetaUnion) and
//! [`ThetaIntersection`](super::ThetaIntersection), A-not-B is not
//! associative or commutative, so there is no benefit to an accumulating
//! multi-input state machine. The stateful [`ThetaANotB`] still exists to
//! mirror the set-operation family's shape (`set_a` then one or more `not_b`
//! calls then `get_result`), but [`a_not_b`] covers the common one-shot case.

use super::compact::CompactThetaSketch;
use super::hash_table::{build_table, lg_size_for_capacity, HashTable};
use super::serialization::compute_seed_hash;
use super::view::ThetaSketchView;
use super::MAX_THETA;
use crate::error::Error;

/// Computes `a \ b`: a compact sketch of every hash retained by `a` that is
/// not also retained by `b`, at `theta = min(a.theta, b.theta)`.
pub fn a_not_b<A, B>(a: &A, b: &B, seed: u64, ordered: bool) -> Result<CompactThetaSketch<'static>, Error>
where
    A: ThetaSketchView,
    B: ThetaSketchView,
{
    let mut op = ThetaANotB::new(seed);
    op.set_a(a)?;
    op.not_b(b)?;
    op.get_result(ordered)
}

/// Stateful A-not-B: `set_a` establishes the minuend, then any number of
/// `not_b` calls subtract further subtrahends, narrowing `result_theta` and
/// the retained set each time.
#[derive(Debug, Clone)]
pub struct ThetaANotB {
    seed: u64,
    state: Option<State>,
}

#[derive(Debug, Clone)]
struct State {
    theta: u64,
    seed_hash: u16,
    /// `None` once the result has collapsed to empty; kept distinct from
    /// `Some(vec![])` only for symmetry with the other set operations, since
    /// both render the same way through `CompactThetaSketch::from_parts`.
    hashes: Vec<u64>,
}

impl ThetaANotB {
    pub fn new(seed: u64) -> Self {
        Self { seed, state: None }
    }

    pub fn with_default_seed() -> Self {
        Self::new(super::DEFAULT_UPDATE_SEED)
    }

    /// Establishes the minuend. Replaces any previous state.
    pub fn set_a<S: ThetaSketchView>(&mut self, a: &S) -> Result<(), Error> {
        self.check_seed(a)?;
        if a.is_empty() {
            self.state = Some(State {
                theta: MAX_THETA,
                seed_hash: compute_seed_hash(self.seed),
                hashes: Vec::new(),
            });
            return Ok(());
        }
        let theta = a.theta_long();
        let hashes: Vec<u64> = a.iter_hashes().filter(|&h| h < theta).collect();
        self.state = Some(State {
            theta,
            seed_hash: compute_seed_hash(self.seed),
            hashes,
        });
        Ok(())
    }

    /// Subtracts `b` from the current state. `set_a` must have been called
    /// first.
    pub fn not_b<S: ThetaSketchView>(&mut self, b: &S) -> Result<(), Error> {
        if b.is_empty() {
            return Ok(());
        }
        self.check_seed(b)?;
        let state = self.state.as_mut().expect("set_a must be called before not_b");
        state.theta = state.theta.min(b.theta_long());
        state.hashes.retain(|&h| h < state.theta);
        if state.hashes.is_empty() {
            return Ok(());
        }
        if b.num_retained() == 0 {
            return Ok(());
        }
        let lg = lg_size_for_capacity(b.num_retained());
        let mut table = HashTable::with_lg_size(lg);
        for h in b.iter_hashes() {
            if h < state.theta {
                table.insert_unique(h);
            }
        }
        state.hashes.retain(|&h| !table.contains_valid(h, u64::MAX));
        Ok(())
    }

    /// Materializes the current `a \ b1 \ b2 \ ...` result.
    pub fn get_result(&self, ordered: bool) -> Result<CompactThetaSketch<'static>, Error> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(Error::virgin_a_not_b)?;
        Ok(CompactThetaSketch::from_parts(
            state.theta,
            state.seed_hash,
            ordered,
            state.hashes.clone(),
        ))
    }

    fn check_seed<S: ThetaSketchView>(&self, sketch: &S) -> Result<(), Error> {
        if sketch.is_empty() {
            return Ok(());
        }
        let expected = compute_seed_hash(self.seed);
        if sketch.seed_hash() != expected {
            return Err(Error::seed_hash_mismatch(expected, sketch.seed_hash()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theta::ThetaSketchBuilder;

    fn make(values: impl Iterator<Item = u64>) -> crate::theta::ThetaSketch {
        let mut s = ThetaSketchBuilder::default().lg_k(10).build();
        for v in values {
            s.update_u64(v).unwrap();
        }
        s
    }

    #[test]
    fn test_a_not_b_removes_overlap() {
        let a = make(0..1000);
        let b = make(500..1500);
        let result = a_not_b(&a, &b, crate::theta::DEFAULT_UPDATE_SEED, true).unwrap();
        assert!((result.estimate() - 500.0).abs() / 500.0 < 0.25);
    }

    #[test]
    fn test_empty_b_leaves_a_unchanged() {
        let a = make(0..200);
        let b = ThetaSketchBuilder::default().build();
        let result = a_not_b(&a, &b, crate::theta::DEFAULT_UPDATE_SEED, true).unwrap();
        assert_eq!(result.num_retained(), a.retained_entries(true));
    }

    #[test]
    fn test_empty_a_is_empty() {
        let a = ThetaSketchBuilder::default().build();
        let b = make(0..200);
        let result = a_not_b(&a, &b, crate::theta::DEFAULT_UPDATE_SEED, true).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_stateful_chain_of_multiple_not_b_calls() {
        let a = make(0..300);
        let b1 = make(0..100);
        let b2 = make(100..200);
        let mut op = ThetaANotB::with_default_seed();
        op.set_a(&a).unwrap();
        op.not_b(&b1).unwrap();
        op.not_b(&b2).unwrap();
        let result = op.get_result(true).unwrap();
        assert!((result.estimate() - 100.0).abs() / 100.0 < 0.3);
    }
}
