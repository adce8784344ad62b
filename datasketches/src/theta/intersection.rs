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

//! The intersection set operation.
//!
//! A freshly constructed intersection represents the Universal Set: it has
//! admitted no input yet, so its retained-entries count is the sentinel `-1`
//! rather than `0`. [`result`](ThetaIntersection::result) is only defined
//! once at least one sketch has been admitted.

use super::compact::CompactThetaSketch;
use super::hash_table::{build_table, lg_size_for_capacity, HashTable};
use super::serialization::compute_seed_hash;
use super::view::ThetaSketchView;
use super::MAX_THETA;
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct ThetaIntersection {
    theta: u64,
    /// `None` is the `curCount = -1` virgin/universal-set sentinel.
    cur_count: Option<usize>,
    table: Option<HashTable>,
    empty: bool,
    seed: u64,
}

impl ThetaIntersection {
    pub fn new(seed: u64) -> Self {
        Self {
            theta: MAX_THETA,
            cur_count: None,
            table: None,
            empty: false,
            seed,
        }
    }

    pub fn with_default_seed() -> Self {
        Self::new(super::DEFAULT_UPDATE_SEED)
    }

    /// Admits `sketch`, narrowing the running intersection.
    pub fn intersect<S: ThetaSketchView>(&mut self, sketch: &S) -> Result<(), Error> {
        if self.empty {
            return Ok(());
        }
        if !sketch.is_empty() {
            let expected = compute_seed_hash(self.seed);
            if sketch.seed_hash() != expected {
                return Err(Error::seed_hash_mismatch(expected, sketch.seed_hash()));
            }
        }
        if sketch.is_empty() {
            self.theta = MAX_THETA;
            self.cur_count = Some(0);
            self.table = None;
            self.empty = true;
            return Ok(());
        }

        self.theta = self.theta.min(sketch.theta_long());
        match self.cur_count {
            None => self.admit_first(sketch),
            Some(0) => {}
            Some(_) => self.admit_subsequent(sketch),
        }
        Ok(())
    }

    fn admit_first<S: ThetaSketchView>(&mut self, sketch: &S) {
        if sketch.num_retained() == 0 {
            self.cur_count = Some(0);
            self.table = None;
            return;
        }
        let lg = lg_size_for_capacity(sketch.num_retained());
        let mut table = HashTable::with_lg_size(lg);
        for h in sketch.iter_hashes() {
            if h < self.theta {
                table.insert_unique(h);
            }
        }
        self.cur_count = Some(table.count_valid(self.theta));
        self.table = Some(table);
    }

    fn admit_subsequent<S: ThetaSketchView>(&mut self, sketch: &S) {
        if sketch.num_retained() == 0 {
            self.cur_count = Some(0);
            self.table = None;
            return;
        }
        let current = self.table.take().expect("curCount > 0 implies a table is present");
        let mut matches = Vec::new();
        for h in sketch.iter_hashes() {
            if h < self.theta {
                if current.contains_valid(h, u64::MAX) {
                    matches.push(h);
                }
            } else if sketch.is_ordered() {
                break;
            }
        }
        if matches.is_empty() {
            self.cur_count = Some(0);
            self.table = None;
        } else {
            let lg = lg_size_for_capacity(matches.len());
            self.cur_count = Some(matches.len());
            self.table = Some(build_table(lg, &matches));
        }
    }

    /// Whether at least one sketch has been admitted; [`result`](Self::result)
    /// is only meaningful once this is true.
    pub fn has_result(&self) -> bool {
        self.cur_count.is_some()
    }

    pub fn result(&self, ordered: bool) -> Result<CompactThetaSketch<'static>, Error> {
        let Some(_) = self.cur_count else {
            return Err(Error::virgin_intersection());
        };
        let entries = match &self.table {
            Some(table) => table.valid_hashes(self.theta),
            None => Vec::new(),
        };
        Ok(CompactThetaSketch::from_parts(
            self.theta,
            compute_seed_hash(self.seed),
            ordered,
            entries,
        ))
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
    fn test_virgin_result_errors() {
        let intersection = ThetaIntersection::with_default_seed();
        assert!(!intersection.has_result());
        assert!(intersection.result(true).is_err());
    }

    #[test]
    fn test_intersection_of_overlapping_sets() {
        let a = make(0..1000);
        let b = make(500..1500);
        let mut x = ThetaIntersection::with_default_seed();
        x.intersect(&a).unwrap();
        x.intersect(&b).unwrap();
        let result = x.result(true).unwrap();
        assert!((result.estimate() - 500.0).abs() / 500.0 < 0.25);
    }

    #[test]
    fn test_intersection_with_disjoint_sets_is_empty() {
        let a = make(0..100);
        let b = make(1000..1100);
        let mut x = ThetaIntersection::with_default_seed();
        x.intersect(&a).unwrap();
        x.intersect(&b).unwrap();
        let result = x.result(true).unwrap();
        assert_eq!(result.num_retained(), 0);
    }

    #[test]
    fn test_empty_input_hard_resets_and_blocks_further_admissions() {
        let a = make(0..100);
        let empty = ThetaSketchBuilder::default().build();
        let mut x = ThetaIntersection::with_default_seed();
        x.intersect(&empty).unwrap();
        x.intersect(&a).unwrap();
        let result = x.result(true).unwrap();
        assert!(result.is_empty());
    }
}
