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

//! The update (mutable) theta sketch family: QuickSelect and Alpha.
//!
//! Both variants share the same hash-table-growth skeleton; Alpha's only
//! difference is that it may overwrite a stale (dirty) slot in place and
//! shrinks theta by a constant factor on every insertion once it reaches
//! nominal size, rather than rebuilding in one jump.

use crate::codec::family::Family;
use crate::codec::{SketchBytes, SketchSlice};
use crate::common::bounds;
use crate::common::{NumStdDev, ResizeFactor};
use crate::error::Error;
use crate::hash::{hash_bytes_item, hash_u64_item};

use super::compact::CompactThetaSketch;
use super::hash_table::{
    build_table, lg_size_for_capacity, rebuild_theta, HashTable, ProbeOutcome, MIN_LG_ARR_LONGS,
};
use super::serialization::{
    compute_seed_hash, FLAG_EMPTY, HASH_SIZE_BYTES, PREAMBLE_LONGS_ESTIMATION, SERIAL_VERSION_3,
};
use super::view::ThetaSketchView;
use super::{theta_as_f64, MAX_THETA};

pub(super) const MIN_LG_K: u8 = 4;
pub(super) const MAX_LG_K: u8 = 26;
pub(super) const DEFAULT_LG_K: u8 = 12;
const MIN_LG_K_FOR_ALPHA: u8 = 9;

/// What [`ThetaSketch::update_hash`] did with an incoming hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// `h >= thetaLong`: the hash cannot possibly belong to the sketch's
    /// current sample.
    RejectedOverTheta,
    /// `h` was already present.
    RejectedDuplicate,
    /// `h` landed in a previously-unoccupied slot; the retained-entries
    /// count increased.
    InsertedCountIncremented,
    /// Alpha only: `h` overwrote a dirty (stale, already-counted) slot, so
    /// the retained-entries bookkeeping did not change even though the set
    /// of valid entries did.
    InsertedCountNotIncremented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    QuickSelect,
    Alpha,
}

impl Variant {
    fn family(self) -> Family {
        match self {
            Variant::QuickSelect => Family::QUICKSELECT,
            Variant::Alpha => Family::ALPHA,
        }
    }
}

/// A mutable theta sketch built incrementally from a stream of items.
#[derive(Debug, Clone)]
pub struct ThetaSketch {
    variant: Variant,
    lg_nom_longs: u8,
    table: HashTable,
    cur_count: usize,
    theta: u64,
    empty: bool,
    p: f32,
    resize_factor: ResizeFactor,
    seed: u64,
    /// Alpha only: whether theta has started shrinking on every insert
    /// (`R > 0` in the spec's state-machine naming).
    alpha_sketch_mode: bool,
}

impl ThetaSketch {
    pub fn builder() -> ThetaSketchBuilder {
        ThetaSketchBuilder::default()
    }

    /// Hashes a 64-bit item the way `MurmurHash3_x64_128` does for this
    /// library's other numeric sketch families, then admits it.
    pub fn update_u64(&mut self, value: u64) -> Result<UpdateOutcome, Error> {
        let hash = hash_u64_item(value, self.seed);
        self.update_hash(hash)
    }

    /// Hashes an arbitrary byte string and admits it.
    pub fn update_bytes(&mut self, value: impl AsRef<[u8]>) -> Result<UpdateOutcome, Error> {
        let hash = hash_bytes_item(value.as_ref(), self.seed);
        self.update_hash(hash)
    }

    pub fn update_str(&mut self, value: &str) -> Result<UpdateOutcome, Error> {
        self.update_bytes(value.as_bytes())
    }

    /// Admits an already-computed hash directly, applying the update
    /// algorithm (reject-over-theta, reject-duplicate, insert-and-maybe-grow)
    /// shared by both variants.
    pub fn update_hash(&mut self, hash: u64) -> Result<UpdateOutcome, Error> {
        if hash == 0 {
            return Err(Error::hash_corruption());
        }
        self.empty = false;
        if hash >= self.theta {
            return Ok(UpdateOutcome::RejectedOverTheta);
        }
        let outcome = match self.variant {
            Variant::Alpha => self.table.find_or_insert_over_dirty(hash, self.theta)?,
            Variant::QuickSelect => self.table.find_or_insert(hash)?,
        };
        match outcome {
            ProbeOutcome::Duplicate(_) => Ok(UpdateOutcome::RejectedDuplicate),
            ProbeOutcome::InsertedOverDirty(_) => {
                self.apply_alpha_growth();
                Ok(UpdateOutcome::InsertedCountNotIncremented)
            }
            ProbeOutcome::InsertedFresh(_) => {
                self.cur_count += 1;
                match self.variant {
                    Variant::QuickSelect => self.maybe_grow_or_rebuild_quick_select(),
                    Variant::Alpha => self.apply_alpha_growth(),
                }
                Ok(UpdateOutcome::InsertedCountIncremented)
            }
        }
    }

    fn threshold(&self) -> usize {
        let lg_arr = self.table.lg_arr_longs();
        let fraction = if lg_arr <= self.lg_nom_longs { 0.5 } else { 15.0 / 16.0 };
        (fraction * self.table.capacity() as f64) as usize
    }

    fn maybe_grow_or_rebuild_quick_select(&mut self) {
        if self.cur_count <= self.threshold() {
            return;
        }
        if self.table.lg_arr_longs() <= self.lg_nom_longs {
            self.grow_table();
        } else {
            self.rebuild_theta_quick_select();
        }
    }

    fn grow_table(&mut self) {
        let growth = self.resize_factor.lg().max(1);
        let new_lg = (self.table.lg_arr_longs() + growth).min(self.lg_nom_longs + 1);
        if new_lg == self.table.lg_arr_longs() {
            self.rebuild_theta_quick_select();
            return;
        }
        let valid = self.table.valid_hashes(self.theta);
        self.table = build_table(new_lg, &valid);
    }

    fn rebuild_theta_quick_select(&mut self) {
        let k = 1usize << self.lg_nom_longs;
        let values = self.table.valid_hashes(self.theta);
        if values.len() <= k {
            return;
        }
        let (new_theta, retained) = rebuild_theta(values, k);
        self.theta = new_theta;
        self.table = build_table(self.table.lg_arr_longs(), &retained);
        self.cur_count = retained.len();
    }

    fn apply_alpha_growth(&mut self) {
        let k = 1usize << self.lg_nom_longs;
        if !self.alpha_sketch_mode {
            if self.cur_count > k {
                self.alpha_sketch_mode = true;
            }
            return;
        }
        let alpha = k as f64 / (k as f64 + 1.0);
        self.theta = ((self.theta as f64) * alpha) as u64;
        if self.cur_count > self.threshold() {
            self.rebuild_alpha();
        }
    }

    fn rebuild_alpha(&mut self) {
        let before = self.cur_count;
        let valid = self.table.valid_hashes(self.theta);
        self.cur_count = valid.len();
        self.table = build_table(self.table.lg_arr_longs(), &valid);
        if self.cur_count >= before && self.table.lg_arr_longs() <= self.lg_nom_longs + 1 {
            self.grow_table();
        }
    }

    /// Discards all hash-table growth and theta decay, returning to the
    /// freshly-built state (same `lgNomLongs`, `p`, seed).
    pub fn reset(&mut self) {
        let rebuilt = ThetaSketchBuilder {
            lg_k: self.lg_nom_longs,
            resize_factor: self.resize_factor,
            sampling_probability: self.p,
            seed: self.seed,
            variant: self.variant,
        }
        .build();
        *self = rebuilt;
    }

    /// Rebuilds the hash table at its minimum size for the entries currently
    /// retained, without changing theta. Useful to reclaim memory after many
    /// updates and few survivors.
    pub fn rebuild(&mut self) {
        let valid = self.table.valid_hashes(self.theta);
        let lg = lg_size_for_capacity(valid.len()).max(MIN_LG_ARR_LONGS);
        self.table = build_table(lg, &valid);
        self.cur_count = valid.len();
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_estimation_mode(&self) -> bool {
        self.theta < MAX_THETA
    }

    pub fn lg_k(&self) -> u8 {
        self.lg_nom_longs
    }

    pub fn theta(&self) -> f64 {
        theta_as_f64(self.theta)
    }

    pub fn estimate(&self) -> f64 {
        bounds::estimate(self.theta(), self.retained_entries(true) as u64)
    }

    pub fn lower_bound(&self, num_std_dev: u8) -> Result<f64, Error> {
        let k = NumStdDev::try_from(num_std_dev)?;
        Ok(bounds::lower_bound(k, self.theta(), self.retained_entries(true) as u64))
    }

    pub fn upper_bound(&self, num_std_dev: u8) -> Result<f64, Error> {
        let k = NumStdDev::try_from(num_std_dev)?;
        Ok(bounds::upper_bound(k, self.theta(), self.retained_entries(true) as u64))
    }

    /// Number of retained entries: either the raw occupied-slot bookkeeping
    /// (`valid = false`) or a rescan counting only hashes below theta
    /// (`valid = true`). For QuickSelect the two always agree; for Alpha
    /// they can diverge once dirty slots accumulate.
    pub fn retained_entries(&self, valid: bool) -> usize {
        if valid {
            self.table.count_valid(self.theta)
        } else {
            self.cur_count
        }
    }

    fn seed_hash(&self) -> u16 {
        compute_seed_hash(self.seed)
    }

    /// Produces an immutable compact snapshot of this sketch's current state.
    pub fn compact(&self, ordered: bool) -> CompactThetaSketch<'static> {
        if self.empty {
            return CompactThetaSketch::from_parts(MAX_THETA, self.seed_hash(), ordered, vec![]);
        }
        let entries = self.table.valid_hashes(self.theta);
        CompactThetaSketch::from_parts(self.theta, self.seed_hash(), ordered, entries)
    }

    /// Update-form wire image: the full physical hash-table array (including
    /// empty and dirty slots), never compacted or sorted.
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = SketchBytes::with_capacity(24 + self.table.capacity() * HASH_SIZE_BYTES);
        w.write_u8((PREAMBLE_LONGS_ESTIMATION & 0x3f) | (self.resize_factor.lg() << 6));
        w.write_u8(SERIAL_VERSION_3);
        w.write_u8(self.variant.family().id);
        w.write_u8(self.lg_nom_longs);
        w.write_u8(self.table.lg_arr_longs());
        let flags = if self.empty { FLAG_EMPTY } else { 0 };
        w.write_u8(flags);
        w.write_u16_le(self.seed_hash());
        w.write_u32_le(self.cur_count as u32);
        w.write_f32_le(self.p);
        w.write_u64_le(self.theta);
        for &h in self.table.entries() {
            w.write_u64_le(h);
        }
        w.into_bytes()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, super::DEFAULT_UPDATE_SEED)
    }

    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        if bytes.len() < 24 {
            return Err(Error::insufficient_data_of(
                "update-sketch preamble",
                format!("need at least 24 bytes, got {}", bytes.len()),
            ));
        }
        let mut cursor = SketchSlice::new(bytes);
        let byte0 = cursor.read_u8().map_err(|_| Error::insufficient_data("preLongs"))?;
        let resize_factor = ResizeFactor::from_lg(byte0 >> 6);
        let ser_ver = cursor.read_u8().map_err(|_| Error::insufficient_data("serVer"))?;
        if ser_ver != SERIAL_VERSION_3 {
            return Err(Error::unsupported_serial_version(SERIAL_VERSION_3, ser_ver));
        }
        let family_id = cursor.read_u8().map_err(|_| Error::insufficient_data("family"))?;
        let variant = if family_id == Family::ALPHA.id {
            Variant::Alpha
        } else if family_id == Family::QUICKSELECT.id {
            Variant::QuickSelect
        } else {
            return Err(Error::invalid_family(Family::QUICKSELECT.id, family_id, "update sketch"));
        };
        let lg_nom_longs = cursor.read_u8().map_err(|_| Error::insufficient_data("lgNomLongs"))?;
        let lg_arr_longs = cursor.read_u8().map_err(|_| Error::insufficient_data("lgArrLongs"))?;
        let flags = cursor.read_u8().map_err(|_| Error::insufficient_data("flags"))?;
        let seed_hash = cursor.read_u16_le().map_err(|_| Error::insufficient_data("seedHash"))?;
        let expected = compute_seed_hash(seed);
        if seed_hash != expected {
            return Err(Error::seed_hash_mismatch(expected, seed_hash));
        }
        let cur_count = cursor.read_u32_le().map_err(|_| Error::insufficient_data("curCount"))? as usize;
        let p = cursor.read_f32_le().map_err(|_| Error::insufficient_data("p"))?;
        let theta = cursor.read_u64_le().map_err(|_| Error::insufficient_data("thetaLong"))?;
        if theta == 0 {
            return Err(Error::theta_corruption(theta));
        }
        let is_empty = flags & FLAG_EMPTY != 0;
        if is_empty && cur_count != 0 {
            return Err(Error::empty_with_nonzero_count(cur_count));
        }
        let capacity = 1usize << lg_arr_longs;
        let needed = 24 + capacity * HASH_SIZE_BYTES;
        if bytes.len() < needed {
            return Err(Error::insufficient_data_of(
                "hash table array",
                format!("need {needed} bytes, got {}", bytes.len()),
            ));
        }
        let mut entries = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            entries.push(cursor.read_u64_le().map_err(|_| Error::insufficient_data("entry"))?);
        }
        Ok(ThetaSketch {
            variant,
            lg_nom_longs,
            table: HashTable::from_entries(lg_arr_longs, entries),
            cur_count,
            theta,
            empty: is_empty,
            p,
            resize_factor,
            seed,
            alpha_sketch_mode: matches!(variant, Variant::Alpha) && theta < MAX_THETA,
        })
    }
}

impl ThetaSketchView for ThetaSketch {
    fn is_empty(&self) -> bool {
        self.empty
    }

    fn is_ordered(&self) -> bool {
        false
    }

    fn num_retained(&self) -> usize {
        self.retained_entries(true)
    }

    fn theta_long(&self) -> u64 {
        self.theta
    }

    fn seed_hash(&self) -> u16 {
        ThetaSketch::seed_hash(self)
    }

    fn iter_hashes(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.table.valid_hashes(self.theta).into_iter())
    }
}

/// Builder for [`ThetaSketch`].
#[derive(Debug, Clone, Copy)]
pub struct ThetaSketchBuilder {
    lg_k: u8,
    resize_factor: ResizeFactor,
    sampling_probability: f32,
    seed: u64,
    variant: Variant,
}

impl Default for ThetaSketchBuilder {
    fn default() -> Self {
        Self {
            lg_k: DEFAULT_LG_K,
            resize_factor: ResizeFactor::default(),
            sampling_probability: 1.0,
            seed: super::DEFAULT_UPDATE_SEED,
            variant: Variant::QuickSelect,
        }
    }
}

impl ThetaSketchBuilder {
    /// Sets `lgNomLongs`, the log2 of nominal entries `k`.
    ///
    /// # Panics
    ///
    /// If `lg_k` is not in `[4, 26]`.
    pub fn lg_k(mut self, lg_k: u8) -> Self {
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&lg_k),
            "lg_k must be in [{MIN_LG_K}, {MAX_LG_K}], got {lg_k}"
        );
        self.lg_k = lg_k;
        self
    }

    pub fn resize_factor(mut self, factor: ResizeFactor) -> Self {
        self.resize_factor = factor;
        self
    }

    /// Sets the sampling probability `p`.
    ///
    /// # Panics
    ///
    /// If `p` is not in `(0.0, 1.0]`.
    pub fn sampling_probability(mut self, p: f32) -> Self {
        assert!(
            p > 0.0 && p <= 1.0,
            "sampling_probability must be in (0.0, 1.0], got {p}"
        );
        self.sampling_probability = p;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Selects the Alpha variant instead of the default QuickSelect.
    ///
    /// # Panics
    ///
    /// If `lg_k` at build time is below 9, the minimum nominal size for
    /// which Alpha's bias correction is valid.
    pub fn alpha(mut self) -> Self {
        self.variant = Variant::Alpha;
        self
    }

    pub fn build(self) -> ThetaSketch {
        if self.variant == Variant::Alpha {
            assert!(
                self.lg_k >= MIN_LG_K_FOR_ALPHA,
                "Alpha requires lg_k >= {MIN_LG_K_FOR_ALPHA}, got {}",
                self.lg_k
            );
        }
        let theta = ((self.sampling_probability as f64) * (MAX_THETA as f64)) as u64;
        ThetaSketch {
            variant: self.variant,
            lg_nom_longs: self.lg_k,
            table: HashTable::with_lg_size(MIN_LG_ARR_LONGS),
            cur_count: 0,
            theta,
            empty: true,
            p: self.sampling_probability,
            resize_factor: self.resize_factor,
            seed: self.seed,
            alpha_sketch_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_sketch_is_empty_and_estimates_zero() {
        let sketch = ThetaSketch::builder().build();
        assert!(sketch.is_empty());
        assert_eq!(sketch.estimate(), 0.0);
    }

    #[test]
    fn test_update_rejects_duplicates() {
        let mut sketch = ThetaSketch::builder().lg_k(10).build();
        let first = sketch.update_u64(42).unwrap();
        let second = sketch.update_u64(42).unwrap();
        assert_eq!(first, UpdateOutcome::InsertedCountIncremented);
        assert_eq!(second, UpdateOutcome::RejectedDuplicate);
        assert_eq!(sketch.retained_entries(true), 1);
    }

    #[test]
    fn test_estimate_is_reasonably_close_after_many_inserts() {
        let mut sketch = ThetaSketch::builder().lg_k(12).build();
        for i in 0..20_000u64 {
            sketch.update_u64(i).unwrap();
        }
        let est = sketch.estimate();
        assert!((est - 20_000.0).abs() / 20_000.0 < 0.1);
        assert!(sketch.lower_bound(2).unwrap() <= est);
        assert!(est <= sketch.upper_bound(2).unwrap());
    }

    #[test]
    fn test_compact_round_trips_through_serialize() {
        let mut sketch = ThetaSketch::builder().lg_k(10).build();
        for i in 0..50u64 {
            sketch.update_u64(i).unwrap();
        }
        let bytes = sketch.serialize();
        let restored = ThetaSketch::deserialize(&bytes).unwrap();
        assert_eq!(restored.retained_entries(true), sketch.retained_entries(true));
        assert_eq!(restored.theta_long(), sketch.theta_long());
    }

    #[test]
    fn test_alpha_requires_minimum_lg_k() {
        let result = std::panic::catch_unwind(|| ThetaSketch::builder().lg_k(4).alpha().build());
        assert!(result.is_err());
    }

    #[test]
    fn test_reset_returns_to_virgin_state() {
        let mut sketch = ThetaSketch::builder().lg_k(10).build();
        sketch.update_u64(1).unwrap();
        sketch.reset();
        assert!(sketch.is_empty());
        assert_eq!(sketch.retained_entries(true), 0);
    }
}
