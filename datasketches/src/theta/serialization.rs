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

//! Binary serialization format constants for Theta sketches.
//!
//! This module holds everything that is dictated by the on-the-wire contract:
//! preamble sizes, family IDs, flag bits, and the two serialization versions
//! (3, uncompressed; 4, delta-compressed ordered compact).

use std::hash::Hasher;

use crate::hash::MurmurHash3X64128;

pub(super) const SERIAL_VERSION_3: u8 = 3;
pub(super) const SERIAL_VERSION_4: u8 = 4;

/// PreambleLongs for the canonical empty image (1 long = 8 bytes).
pub(super) const PREAMBLE_LONGS_EMPTY: u8 = 1;
/// PreambleLongs for single-item and exact (non-estimating) compact images.
pub(super) const PREAMBLE_LONGS_EXACT: u8 = 2;
/// PreambleLongs for estimating compact images and update-sketch images.
pub(super) const PREAMBLE_LONGS_ESTIMATION: u8 = 3;
/// PreambleLongs for Union images, which carry an extra unionThetaLong.
pub(super) const PREAMBLE_LONGS_UNION: u8 = 4;

// Flags (byte 5), one bit each.
pub(super) const FLAG_BIG_ENDIAN: u8 = 1 << 0;
pub(super) const FLAG_READ_ONLY: u8 = 1 << 1;
pub(super) const FLAG_EMPTY: u8 = 1 << 2;
pub(super) const FLAG_COMPACT: u8 = 1 << 3;
pub(super) const FLAG_ORDERED: u8 = 1 << 4;
pub(super) const FLAG_SINGLE_ITEM: u8 = 1 << 5;

pub(super) const HASH_SIZE_BYTES: usize = 8;

/// Default seed used throughout Apache DataSketches when the caller does not
/// supply one of their own.
pub const DEFAULT_UPDATE_SEED: u64 = 9001;

/// Derives the 16-bit seed hash embedded in every serialized image, used to
/// detect sketches built with mismatched seeds when they are combined.
pub(super) fn compute_seed_hash(seed: u64) -> u16 {
    let mut hasher = MurmurHash3X64128::with_seed(0);
    hasher.write(&seed.to_le_bytes());
    let (h1, _) = hasher.finish128();
    (h1 & 0xffff) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canonical 8-byte image of an empty compact sketch built with the
    /// default seed: preLongs=1, serVer=3, family=Compact,
    /// flags=read-only|empty|compact|ordered.
    const EMPTY_CANONICAL_IMAGE: [u8; 8] = [0x01, 0x03, 0x03, 0x00, 0x00, 0x1E, 0x00, 0x00];

    #[test]
    fn test_flag_masks_are_distinct_powers_of_two() {
        let flags = [
            FLAG_BIG_ENDIAN,
            FLAG_READ_ONLY,
            FLAG_EMPTY,
            FLAG_COMPACT,
            FLAG_ORDERED,
            FLAG_SINGLE_ITEM,
        ];
        for (i, a) in flags.iter().enumerate() {
            for (j, b) in flags.iter().enumerate() {
                if i != j {
                    assert_eq!(a & b, 0);
                }
            }
        }
    }

    #[test]
    fn test_empty_canonical_flags_byte() {
        assert_eq!(
            EMPTY_CANONICAL_IMAGE[5],
            FLAG_READ_ONLY | FLAG_EMPTY | FLAG_COMPACT | FLAG_ORDERED
        );
    }

    #[test]
    fn test_seed_hash_is_deterministic() {
        assert_eq!(
            compute_seed_hash(DEFAULT_UPDATE_SEED),
            compute_seed_hash(DEFAULT_UPDATE_SEED)
        );
        assert_ne!(
            compute_seed_hash(DEFAULT_UPDATE_SEED),
            compute_seed_hash(DEFAULT_UPDATE_SEED + 1)
        );
    }
}
