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

//! Open-addressing hash-table primitives shared by the update-sketch family
//! and the set operations.
//!
//! Slot `0` means empty. Probing uses a stride derived from high bits of the
//! hash so that two hashes colliding on their initial probe index still walk
//! different sequences.

use crate::error::Error;

pub(super) const MIN_LG_ARR_LONGS: u8 = 5;

const STRIDE_HASH_BITS: u8 = 6;
const STRIDE_MASK: u64 = (1 << STRIDE_HASH_BITS) - 1;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum ProbeOutcome {
    /// Landed in a slot that was genuinely empty (never occupied).
    InsertedFresh(usize),
    /// Landed in a slot that held a stale (dirty, `>= theta`) entry, which was
    /// overwritten. Only possible via [`HashTable::find_or_insert_over_dirty`].
    InsertedOverDirty(usize),
    Duplicate(usize),
}

#[derive(Debug, Clone)]
pub(super) struct HashTable {
    entries: Vec<u64>,
    lg_arr_longs: u8,
}

impl HashTable {
    pub(super) fn with_lg_size(lg_arr_longs: u8) -> Self {
        Self {
            entries: vec![0u64; 1usize << lg_arr_longs],
            lg_arr_longs,
        }
    }

    pub(super) fn from_entries(lg_arr_longs: u8, entries: Vec<u64>) -> Self {
        debug_assert_eq!(entries.len(), 1usize << lg_arr_longs);
        Self {
            entries,
            lg_arr_longs,
        }
    }

    pub(super) fn lg_arr_longs(&self) -> u8 {
        self.lg_arr_longs
    }

    pub(super) fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn entries(&self) -> &[u64] {
        &self.entries
    }

    fn stride(hash: u64, lg_arr_longs: u8) -> u64 {
        2 * ((hash >> lg_arr_longs) & STRIDE_MASK) + 1
    }

    /// Finds `hash`, inserting it into the first empty slot encountered if it
    /// is not already present. Errors if the probe sequence returns to its
    /// start without finding either the hash or an empty slot, which can only
    /// happen if the table is completely full.
    pub(super) fn find_or_insert(&mut self, hash: u64) -> Result<ProbeOutcome, Error> {
        self.probe(hash, u64::MAX)
    }

    /// Like [`find_or_insert`](Self::find_or_insert), but a slot holding a
    /// *dirty* entry (a stale hash `>= theta`) may be overwritten just like an
    /// empty one. Used by the Alpha variant, whose decrementing theta leaves
    /// stale entries behind.
    pub(super) fn find_or_insert_over_dirty(
        &mut self,
        hash: u64,
        theta: u64,
    ) -> Result<ProbeOutcome, Error> {
        self.probe(hash, theta)
    }

    fn probe(&mut self, hash: u64, dirty_threshold: u64) -> Result<ProbeOutcome, Error> {
        let mask = (self.entries.len() - 1) as u64;
        let stride = Self::stride(hash, self.lg_arr_longs);
        let start = hash & mask;
        let mut idx = start;
        loop {
            let slot = self.entries[idx as usize];
            if slot == 0 {
                self.entries[idx as usize] = hash;
                return Ok(ProbeOutcome::InsertedFresh(idx as usize));
            }
            if slot >= dirty_threshold {
                self.entries[idx as usize] = hash;
                return Ok(ProbeOutcome::InsertedOverDirty(idx as usize));
            }
            if slot == hash {
                return Ok(ProbeOutcome::Duplicate(idx as usize));
            }
            idx = (idx + stride) & mask;
            if idx == start {
                return Err(Error::hash_table_full());
            }
        }
    }

    /// Inserts `hash` into the first empty slot on its probe sequence,
    /// without checking for a pre-existing duplicate. Only safe when the
    /// caller already knows `hash` is unique, e.g. when rebuilding a table
    /// from a deduplicated source.
    pub(super) fn insert_unique(&mut self, hash: u64) {
        let mask = (self.entries.len() - 1) as u64;
        let stride = Self::stride(hash, self.lg_arr_longs);
        let mut idx = hash & mask;
        loop {
            if self.entries[idx as usize] == 0 {
                self.entries[idx as usize] = hash;
                return;
            }
            idx = (idx + stride) & mask;
        }
    }

    pub(super) fn contains_valid(&self, hash: u64, theta: u64) -> bool {
        if hash == 0 || hash >= theta {
            return false;
        }
        let mask = (self.entries.len() - 1) as u64;
        let stride = Self::stride(hash, self.lg_arr_longs);
        let start = hash & mask;
        let mut idx = start;
        loop {
            let slot = self.entries[idx as usize];
            if slot == 0 {
                return false;
            }
            if slot == hash {
                return true;
            }
            idx = (idx + stride) & mask;
            if idx == start {
                return false;
            }
        }
    }

    pub(super) fn count_valid(&self, theta: u64) -> usize {
        self.entries.iter().filter(|&&h| h != 0 && h < theta).count()
    }

    /// Copies out only the live hashes below `theta`, dropping empty and
    /// dirty slots.
    pub(super) fn valid_hashes(&self, theta: u64) -> Vec<u64> {
        self.entries
            .iter()
            .copied()
            .filter(|&h| h != 0 && h < theta)
            .collect()
    }
}

/// Builds a table of the given log-size from a slice of known-unique hashes,
/// e.g. when rehydrating from a deserialized image or growing a table.
pub(super) fn build_table(lg_arr_longs: u8, hashes: &[u64]) -> HashTable {
    let mut table = HashTable::with_lg_size(lg_arr_longs);
    for &h in hashes {
        table.insert_unique(h);
    }
    table
}

/// Selects the `target_count`-th smallest hash (0-indexed) via partial
/// sorting, returning the new theta (that hash itself, which is therefore
/// evicted) and the `target_count` hashes strictly below it.
///
/// Panics if `values.len() <= target_count`; callers only rebuild once the
/// table holds more than `target_count` valid entries.
pub(super) fn rebuild_theta(mut values: Vec<u64>, target_count: usize) -> (u64, Vec<u64>) {
    assert!(values.len() > target_count);
    let (lesser, &mut kth, _) = values.select_nth_unstable(target_count);
    (kth, lesser.to_vec())
}

/// The smallest `lgArrLongs` whose `1/2`-load threshold can hold
/// `min_capacity` entries without immediately triggering a resize.
pub(super) fn lg_size_for_capacity(min_capacity: usize) -> u8 {
    let mut lg = MIN_LG_ARR_LONGS;
    while ((1usize << lg) / 2) < min_capacity {
        lg += 1;
    }
    lg
}
