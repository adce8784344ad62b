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

//! The union set operation: an accumulating merge of any number of sketches.

use crate::codec::family::Family;
use crate::codec::SketchBytes;
use crate::error::Error;

use super::compact::CompactThetaSketch;
use super::serialization::{
    compute_seed_hash, FLAG_EMPTY, PREAMBLE_LONGS_ESTIMATION, PREAMBLE_LONGS_UNION,
};
use super::sketch::ThetaSketch;
use super::view::ThetaSketchView;
use super::MAX_THETA;

/// Accumulates the union of every sketch passed to [`union`](Self::union).
///
/// Tracks a `unionThetaLong` independent of the internal accumulator
/// sketch's own theta: the running minimum of every theta ever observed,
/// including input sketches whose hashes never get an opportunity to enter
/// the accumulator directly (e.g. a single very small-theta sketch unioned
/// first).
#[derive(Debug, Clone)]
pub struct ThetaUnion {
    accumulator: ThetaSketch,
    union_theta: u64,
}

impl ThetaUnion {
    pub fn new(lg_k: u8, seed: u64) -> Self {
        Self {
            accumulator: ThetaSketch::builder().lg_k(lg_k).seed(seed).build(),
            union_theta: MAX_THETA,
        }
    }

    pub fn with_default_seed(lg_k: u8) -> Self {
        Self::new(lg_k, super::DEFAULT_UPDATE_SEED)
    }

    /// Folds `sketch` into the running union.
    pub fn union<S: ThetaSketchView>(&mut self, sketch: &S) -> Result<(), Error> {
        if sketch.is_empty() {
            return Ok(());
        }
        let expected = self.accumulator.seed_hash();
        if sketch.seed_hash() != expected {
            return Err(Error::seed_hash_mismatch(expected, sketch.seed_hash()));
        }
        self.union_theta = self.union_theta.min(sketch.theta_long());
        for hash in sketch.iter_hashes() {
            if hash >= self.union_theta {
                if sketch.is_ordered() {
                    break;
                }
                continue;
            }
            self.accumulator.update_hash(hash)?;
        }
        Ok(())
    }

    /// Materializes the union result as a compact sketch.
    pub fn result(&self, ordered: bool) -> CompactThetaSketch<'static> {
        let result_theta = self.accumulator.theta_long().min(self.union_theta);
        let entries: Vec<u64> = self
            .accumulator
            .iter_hashes()
            .filter(|&h| h < result_theta)
            .collect();
        CompactThetaSketch::from_parts(result_theta, self.accumulator.seed_hash(), ordered, entries)
    }

    /// Wire image: the accumulator's own preamble-3 fields (patched to
    /// `preLongs = 4` and `family = UNION`), followed by the union's
    /// running `unionThetaLong` as a fourth long.
    pub fn serialize(&self) -> Vec<u8> {
        let mut inner = self.accumulator.serialize();
        inner[0] = (inner[0] & 0xc0) | PREAMBLE_LONGS_UNION;
        inner[2] = Family::UNION.id;
        if self.accumulator.is_empty() && self.union_theta >= MAX_THETA {
            inner[5] |= FLAG_EMPTY;
        }
        let mut w = SketchBytes::with_capacity(inner.len() + 8);
        w.write(&inner[..24]);
        w.write_u64_le(self.union_theta);
        w.write(&inner[24..]);
        w.into_bytes()
    }

    pub fn deserialize(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        if bytes.len() < 32 {
            return Err(Error::insufficient_data_of(
                "union preamble",
                format!("need at least 32 bytes, got {}", bytes.len()),
            ));
        }
        Family::UNION.validate_id(bytes[2])?;
        let seed_hash = u16::from_le_bytes([bytes[6], bytes[7]]);
        let expected = compute_seed_hash(seed);
        if seed_hash != expected {
            return Err(Error::seed_hash_mismatch(expected, seed_hash));
        }
        let union_theta = u64::from_le_bytes(bytes[24..32].try_into().unwrap());
        if union_theta == 0 {
            return Err(Error::theta_corruption(union_theta));
        }
        let mut inner = Vec::with_capacity(bytes.len() - 8);
        inner.extend_from_slice(&bytes[..24]);
        inner.extend_from_slice(&bytes[32..]);
        inner[0] = (inner[0] & 0xc0) | PREAMBLE_LONGS_ESTIMATION;
        inner[2] = Family::QUICKSELECT.id;
        let accumulator = ThetaSketch::deserialize_with_seed(&inner, seed)?;
        Ok(Self {
            accumulator,
            union_theta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theta::ThetaSketchBuilder;

    fn make(values: impl Iterator<Item = u64>) -> ThetaSketch {
        let mut s = ThetaSketchBuilder::default().lg_k(10).build();
        for v in values {
            s.update_u64(v).unwrap();
        }
        s
    }

    #[test]
    fn test_union_of_disjoint_sets_sums_estimate() {
        let a = make(0..500);
        let b = make(500..1000);
        let mut u = ThetaUnion::with_default_seed(10);
        u.union(&a).unwrap();
        u.union(&b).unwrap();
        let result = u.result(true);
        assert!((result.estimate() - 1000.0).abs() / 1000.0 < 0.2);
    }

    #[test]
    fn test_union_with_empty_input_is_noop() {
        let a = make(0..100);
        let empty = ThetaSketchBuilder::default().build();
        let mut u = ThetaUnion::with_default_seed(10);
        u.union(&a).unwrap();
        u.union(&empty).unwrap();
        assert_eq!(u.result(true).num_retained(), a.retained_entries(true));
    }

    #[test]
    fn test_seed_mismatch_is_rejected() {
        let a = make(0..10);
        let mut u = ThetaUnion::new(10, 123);
        assert!(u.union(&a).is_err());
    }
}
