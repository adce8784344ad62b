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

//! The compact (immutable, serialization-ready) theta sketch family.
//!
//! A compact sketch never holds a hash table: it is either one of the two
//! degenerate scalar forms (empty, single-item) or a finalized array of
//! unique hashes below `thetaLong`, either owned on the heap or viewed
//! zero-copy over a caller-supplied byte slice.

use crate::codec::family::Family;
use crate::codec::SketchBytes;
use crate::common::bounds;
use crate::common::NumStdDev;
use crate::error::Error;

use super::bit_pack::{pack_all, packed_bytes_needed, unpack_all, BitUnpacker};
use super::serialization::{
    compute_seed_hash, FLAG_COMPACT, FLAG_EMPTY, FLAG_ORDERED, FLAG_READ_ONLY, FLAG_SINGLE_ITEM,
    HASH_SIZE_BYTES, PREAMBLE_LONGS_EMPTY, PREAMBLE_LONGS_ESTIMATION, PREAMBLE_LONGS_EXACT,
    SERIAL_VERSION_3, SERIAL_VERSION_4,
};
use super::view::ThetaSketchView;
use super::{theta_as_f64, MAX_THETA};

#[derive(Debug, Clone)]
struct HeapData {
    entries: Vec<u64>,
    theta: u64,
    seed_hash: u16,
}

#[derive(Debug, Clone, Copy)]
struct BufferData<'a> {
    bytes: &'a [u8],
    theta: u64,
    num_entries: usize,
    seed_hash: u16,
    entries_offset: usize,
}

#[derive(Debug, Clone, Copy)]
struct BufferCompressedData<'a> {
    bytes: &'a [u8],
    theta: u64,
    num_entries: usize,
    seed_hash: u16,
    entry_bits: u8,
    entries_offset: usize,
}

/// An immutable theta sketch ready for serialization or as a set-operation
/// input. Never contains a hash table; construction always goes through
/// [`CompactThetaSketch::from_parts`] or a deserializer so the dispatch rules
/// in the module-level truth table are enforced in one place.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CompactThetaSketch<'a> {
    Empty { seed_hash: u16 },
    SingleItem { hash: u64, seed_hash: u16 },
    HeapOrdered(HeapData),
    HeapUnordered(HeapData),
    BufferOrdered(BufferData<'a>),
    BufferUnordered(BufferData<'a>),
    BufferCompressed(BufferCompressedData<'a>),
}

use CompactThetaSketch::*;

impl<'a> CompactThetaSketch<'a> {
    /// Builds the correct variant from a finalized, already compact-cached
    /// hash array (no zero or dirty slots), applying the normalization rules
    /// from the empty/single-item/heap truth table.
    pub(super) fn from_parts(
        theta: u64,
        seed_hash: u16,
        ordered: bool,
        mut entries: Vec<u64>,
    ) -> CompactThetaSketch<'static> {
        if entries.is_empty() && theta >= MAX_THETA {
            return Empty { seed_hash };
        }
        if entries.len() == 1 && theta >= MAX_THETA {
            return SingleItem {
                hash: entries[0],
                seed_hash,
            };
        }
        if ordered {
            entries.sort_unstable();
            HeapOrdered(HeapData {
                entries,
                theta,
                seed_hash,
            })
        } else {
            HeapUnordered(HeapData {
                entries,
                theta,
                seed_hash,
            })
        }
    }

    pub fn is_single_item(&self) -> bool {
        matches!(self, SingleItem { .. })
    }

    pub fn is_estimation_mode(&self) -> bool {
        self.theta_long() < MAX_THETA
    }

    pub fn theta(&self) -> f64 {
        theta_as_f64(self.theta_long())
    }

    pub fn estimate(&self) -> f64 {
        bounds::estimate(self.theta(), self.num_retained() as u64)
    }

    pub fn lower_bound(&self, num_std_dev: u8) -> Result<f64, Error> {
        let k = NumStdDev::try_from(num_std_dev)?;
        Ok(bounds::lower_bound(k, self.theta(), self.num_retained() as u64))
    }

    pub fn upper_bound(&self, num_std_dev: u8) -> Result<f64, Error> {
        let k = NumStdDev::try_from(num_std_dev)?;
        Ok(bounds::upper_bound(k, self.theta(), self.num_retained() as u64))
    }

    /// Number of bytes an uncompressed ([`serialize`](Self::serialize)) image
    /// of this sketch would occupy, without actually building it.
    pub fn current_bytes(&self) -> usize {
        match self {
            Empty { .. } => 8,
            SingleItem { .. } => 16,
            _ => 24 + self.num_retained() * HASH_SIZE_BYTES,
        }
    }

    /// Re-materializes this sketch as an owned heap sketch, re-sorting if
    /// `ordered` is requested.
    pub fn compact(&self, ordered: bool) -> CompactThetaSketch<'static> {
        match self {
            Empty { seed_hash } => Empty { seed_hash: *seed_hash },
            SingleItem { hash, seed_hash } => SingleItem {
                hash: *hash,
                seed_hash: *seed_hash,
            },
            _ => {
                let entries: Vec<u64> = self.iter_hashes().collect();
                CompactThetaSketch::from_parts(self.theta_long(), self.seed_hash(), ordered, entries)
            }
        }
    }

    /// Uncompressed (SerVer 3) wire image.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Empty { seed_hash } => {
                let mut w = SketchBytes::with_capacity(8);
                w.write_u8(PREAMBLE_LONGS_EMPTY);
                w.write_u8(SERIAL_VERSION_3);
                w.write_u8(Family::COMPACT.id);
                w.write_u8(0);
                w.write_u8(0);
                w.write_u8(FLAG_READ_ONLY | FLAG_EMPTY | FLAG_COMPACT | FLAG_ORDERED);
                w.write_u16_le(*seed_hash);
                w.into_bytes()
            }
            SingleItem { hash, seed_hash } => {
                let mut w = SketchBytes::with_capacity(16);
                w.write_u8(PREAMBLE_LONGS_EMPTY);
                w.write_u8(SERIAL_VERSION_3);
                w.write_u8(Family::COMPACT.id);
                w.write_u8(0);
                w.write_u8(0);
                w.write_u8(FLAG_READ_ONLY | FLAG_COMPACT | FLAG_ORDERED | FLAG_SINGLE_ITEM);
                w.write_u16_le(*seed_hash);
                w.write_u64_le(*hash);
                w.into_bytes()
            }
            _ => {
                let entries: Vec<u64> = self.iter_hashes().collect();
                let mut w = SketchBytes::with_capacity(24 + entries.len() * HASH_SIZE_BYTES);
                w.write_u8(PREAMBLE_LONGS_ESTIMATION);
                w.write_u8(SERIAL_VERSION_3);
                w.write_u8(Family::COMPACT.id);
                w.write_u8(0);
                w.write_u8(0);
                let mut flags = FLAG_READ_ONLY | FLAG_COMPACT;
                if self.is_ordered() {
                    flags |= FLAG_ORDERED;
                }
                w.write_u8(flags);
                w.write_u16_le(self.seed_hash());
                w.write_u32_le(entries.len() as u32);
                w.write_f32_le(1.0);
                w.write_u64_le(self.theta_long());
                for h in entries {
                    w.write_u64_le(h);
                }
                w.into_bytes()
            }
        }
    }

    /// Delta-compressed, bit-packed SerVer 4 image. Falls back to
    /// [`serialize`](Self::serialize) for the empty and single-item forms,
    /// which are already minimal.
    pub fn serialize_compressed(&self) -> Vec<u8> {
        if self.is_empty() || self.is_single_item() {
            return self.serialize();
        }
        let mut entries: Vec<u64> = self.iter_hashes().collect();
        entries.sort_unstable();
        let theta = self.theta_long();
        let entry_bits = (64 - theta.leading_zeros()) as u8;
        let count = entries.len() as u64;
        let num_entries_bytes: u8 = if count == 0 {
            1
        } else {
            (64 - count.leading_zeros()).div_ceil(8) as u8
        };
        let estimating = theta < MAX_THETA;

        let mut deltas = Vec::with_capacity(entries.len());
        let mut previous = 0u64;
        for &h in &entries {
            deltas.push(h - previous);
            previous = h;
        }
        let packed_len = packed_bytes_needed(deltas.len(), entry_bits);

        let mut w = SketchBytes::with_capacity(16 + num_entries_bytes as usize + packed_len);
        w.write_u8(if estimating {
            PREAMBLE_LONGS_ESTIMATION
        } else {
            PREAMBLE_LONGS_EXACT
        });
        w.write_u8(SERIAL_VERSION_4);
        w.write_u8(Family::COMPACT.id);
        w.write_u8(entry_bits);
        w.write_u8(num_entries_bytes);
        w.write_u8(FLAG_READ_ONLY | FLAG_COMPACT | FLAG_ORDERED);
        w.write_u16_le(self.seed_hash());
        if estimating {
            w.write_u64_le(theta);
        }
        let count_bytes = count.to_le_bytes();
        w.write(&count_bytes[..num_entries_bytes as usize]);
        let mut packed = vec![0u8; packed_len];
        pack_all(&deltas, entry_bits, &mut packed);
        w.write(&packed);
        w.into_bytes()
    }

    /// Deserializes using the library's default update seed.
    pub fn deserialize(bytes: &[u8]) -> Result<CompactThetaSketch<'static>, Error> {
        Self::from_bytes(bytes, super::DEFAULT_UPDATE_SEED)
    }

    /// Deserializes, checking the embedded seed hash against `seed` rather
    /// than the default.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<CompactThetaSketch<'static>, Error> {
        Self::from_bytes(bytes, seed)
    }

    fn from_bytes(bytes: &[u8], seed: u64) -> Result<CompactThetaSketch<'static>, Error> {
        let header = Header::parse(bytes, seed)?;
        match header.ser_ver {
            SERIAL_VERSION_3 => Self::owned_v3(bytes, &header),
            SERIAL_VERSION_4 => Self::owned_v4(bytes, &header),
            other => Err(Error::unsupported_serial_version(SERIAL_VERSION_3, other)),
        }
    }

    /// Wraps `bytes` without copying the hash payload; only the fixed-size
    /// preamble and per-entry bookkeeping are read eagerly.
    pub fn wrap(bytes: &'a [u8], seed: u64) -> Result<CompactThetaSketch<'a>, Error> {
        let header = Header::parse(bytes, seed)?;
        match header.ser_ver {
            SERIAL_VERSION_3 => Self::wrap_v3(bytes, &header),
            SERIAL_VERSION_4 => Self::wrap_v4(bytes, &header),
            other => Err(Error::unsupported_serial_version(SERIAL_VERSION_3, other)),
        }
    }

    fn owned_v3(bytes: &[u8], header: &Header) -> Result<CompactThetaSketch<'static>, Error> {
        if let Some(empty) = header.empty_variant()? {
            return Ok(empty);
        }
        if header.is_single_item {
            let hash = header.read_single_item_hash(bytes)?;
            return Ok(SingleItem {
                hash,
                seed_hash: header.seed_hash,
            });
        }
        let (cur_count, theta, entries_offset) = header.v3_body(bytes)?;
        let needed = entries_offset + cur_count * HASH_SIZE_BYTES;
        if bytes.len() < needed {
            return Err(Error::insufficient_data_of(
                "compact entries",
                format!("need {needed} bytes, got {}", bytes.len()),
            ));
        }
        let mut entries = Vec::with_capacity(cur_count);
        for i in 0..cur_count {
            let off = entries_offset + i * HASH_SIZE_BYTES;
            entries.push(u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap()));
        }
        Ok(CompactThetaSketch::from_parts(
            theta,
            header.seed_hash,
            header.is_ordered,
            entries,
        ))
    }

    fn owned_v4(bytes: &[u8], header: &Header) -> Result<CompactThetaSketch<'static>, Error> {
        if let Some(empty) = header.empty_variant()? {
            return Ok(empty);
        }
        let (theta, count, entries_offset, entry_bits) = header.v4_body(bytes)?;
        let packed_len = packed_bytes_needed(count, entry_bits);
        if bytes.len() < entries_offset + packed_len {
            return Err(Error::insufficient_data_of(
                "compressed entries",
                format!("need {} bytes, got {}", entries_offset + packed_len, bytes.len()),
            ));
        }
        let deltas = unpack_all(&bytes[entries_offset..entries_offset + packed_len], entry_bits, count);
        let mut entries = Vec::with_capacity(count);
        let mut previous = 0u64;
        for d in deltas {
            previous += d;
            entries.push(previous);
        }
        Ok(CompactThetaSketch::from_parts(theta, header.seed_hash, true, entries))
    }

    fn wrap_v3(bytes: &'a [u8], header: &Header) -> Result<CompactThetaSketch<'a>, Error> {
        if let Some(empty) = header.empty_variant()? {
            return Ok(empty);
        }
        if header.is_single_item {
            let hash = header.read_single_item_hash(bytes)?;
            return Ok(SingleItem {
                hash,
                seed_hash: header.seed_hash,
            });
        }
        let (cur_count, theta, entries_offset) = header.v3_body(bytes)?;
        let needed = entries_offset + cur_count * HASH_SIZE_BYTES;
        if bytes.len() < needed {
            return Err(Error::insufficient_data_of(
                "compact entries",
                format!("need {needed} bytes, got {}", bytes.len()),
            ));
        }
        if cur_count == 0 && theta >= MAX_THETA {
            return Ok(Empty {
                seed_hash: header.seed_hash,
            });
        }
        if cur_count == 1 && theta >= MAX_THETA {
            let off = entries_offset;
            let hash = u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap());
            return Ok(SingleItem {
                hash,
                seed_hash: header.seed_hash,
            });
        }
        let data = BufferData {
            bytes,
            theta,
            num_entries: cur_count,
            seed_hash: header.seed_hash,
            entries_offset,
        };
        Ok(if header.is_ordered {
            BufferOrdered(data)
        } else {
            BufferUnordered(data)
        })
    }

    fn wrap_v4(bytes: &'a [u8], header: &Header) -> Result<CompactThetaSketch<'a>, Error> {
        if let Some(empty) = header.empty_variant()? {
            return Ok(empty);
        }
        let (theta, count, entries_offset, entry_bits) = header.v4_body(bytes)?;
        let packed_len = packed_bytes_needed(count, entry_bits);
        if bytes.len() < entries_offset + packed_len {
            return Err(Error::insufficient_data_of(
                "compressed entries",
                format!("need {} bytes, got {}", entries_offset + packed_len, bytes.len()),
            ));
        }
        if count == 0 && theta >= MAX_THETA {
            return Ok(Empty {
                seed_hash: header.seed_hash,
            });
        }
        if count == 1 && theta >= MAX_THETA {
            let delta = unpack_all(&bytes[entries_offset..entries_offset + packed_len], entry_bits, 1);
            return Ok(SingleItem {
                hash: delta[0],
                seed_hash: header.seed_hash,
            });
        }
        Ok(BufferCompressed(BufferCompressedData {
            bytes,
            theta,
            num_entries: count,
            seed_hash: header.seed_hash,
            entry_bits,
            entries_offset,
        }))
    }
}

impl<'a> ThetaSketchView for CompactThetaSketch<'a> {
    fn is_empty(&self) -> bool {
        matches!(self, Empty { .. })
    }

    fn is_ordered(&self) -> bool {
        match self {
            Empty { .. } | SingleItem { .. } => true,
            HeapOrdered(_) | BufferOrdered(_) | BufferCompressed(_) => true,
            HeapUnordered(_) | BufferUnordered(_) => false,
        }
    }

    fn num_retained(&self) -> usize {
        match self {
            Empty { .. } => 0,
            SingleItem { .. } => 1,
            HeapOrdered(d) | HeapUnordered(d) => d.entries.len(),
            BufferOrdered(d) | BufferUnordered(d) => d.num_entries,
            BufferCompressed(d) => d.num_entries,
        }
    }

    fn theta_long(&self) -> u64 {
        match self {
            Empty { .. } | SingleItem { .. } => MAX_THETA,
            HeapOrdered(d) | HeapUnordered(d) => d.theta,
            BufferOrdered(d) | BufferUnordered(d) => d.theta,
            BufferCompressed(d) => d.theta,
        }
    }

    fn seed_hash(&self) -> u16 {
        match self {
            Empty { seed_hash } | SingleItem { seed_hash, .. } => *seed_hash,
            HeapOrdered(d) | HeapUnordered(d) => d.seed_hash,
            BufferOrdered(d) | BufferUnordered(d) => d.seed_hash,
            BufferCompressed(d) => d.seed_hash,
        }
    }

    fn iter_hashes(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        match self {
            Empty { .. } => Box::new(std::iter::empty()),
            SingleItem { hash, .. } => Box::new(std::iter::once(*hash)),
            HeapOrdered(d) | HeapUnordered(d) => Box::new(d.entries.iter().copied()),
            BufferOrdered(d) | BufferUnordered(d) => Box::new(BufferIter {
                bytes: d.bytes,
                offset: d.entries_offset,
                remaining: d.num_entries,
            }),
            BufferCompressed(d) => Box::new(CompressedIter {
                unpacker: BitUnpacker::new(&d.bytes[d.entries_offset..]),
                entry_bits: d.entry_bits,
                previous: 0,
                remaining: d.num_entries,
            }),
        }
    }
}

struct BufferIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    remaining: usize,
}

impl Iterator for BufferIter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let h = u64::from_le_bytes(self.bytes[self.offset..self.offset + 8].try_into().unwrap());
        self.offset += 8;
        self.remaining -= 1;
        Some(h)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

struct CompressedIter<'a> {
    unpacker: BitUnpacker<'a>,
    entry_bits: u8,
    previous: u64,
    remaining: usize,
}

impl Iterator for CompressedIter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let delta = self.unpacker.unpack_value(self.entry_bits);
        self.previous += delta;
        self.remaining -= 1;
        Some(self.previous)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Parsed common preamble fields (bytes 0-7), shared by both serialization
/// versions and by both the copying and zero-copy deserialization paths.
struct Header {
    pre_longs: u8,
    ser_ver: u8,
    seed_hash: u16,
    is_empty: bool,
    is_single_item: bool,
    is_ordered: bool,
    entry_bits: u8,
    num_entries_bytes: usize,
}

impl Header {
    fn parse(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        if bytes.len() < 8 {
            return Err(Error::insufficient_data_of(
                "preamble",
                format!("need at least 8 bytes, got {}", bytes.len()),
            ));
        }
        let pre_longs = bytes[0] & 0x3f;
        let ser_ver = bytes[1];
        Family::COMPACT.validate_id(bytes[2])?;
        let entry_bits = bytes[3];
        let num_entries_bytes = bytes[4] as usize;
        let flags = bytes[5];
        let seed_hash = u16::from_le_bytes([bytes[6], bytes[7]]);
        let expected = compute_seed_hash(seed);
        if seed_hash != expected {
            return Err(Error::seed_hash_mismatch(expected, seed_hash));
        }
        Ok(Self {
            pre_longs,
            ser_ver,
            seed_hash,
            is_empty: flags & FLAG_EMPTY != 0,
            is_single_item: flags & FLAG_SINGLE_ITEM != 0,
            is_ordered: flags & FLAG_ORDERED != 0,
            entry_bits,
            num_entries_bytes,
        })
    }

    /// If the empty flag is set, returns the (validated) `Empty` variant;
    /// `Ok(None)` if the flag is unset so the caller continues parsing.
    fn empty_variant(&self) -> Result<Option<CompactThetaSketch<'static>>, Error> {
        if !self.is_empty {
            return Ok(None);
        }
        Ok(Some(CompactThetaSketch::Empty {
            seed_hash: self.seed_hash,
        }))
    }

    fn read_single_item_hash(&self, bytes: &[u8]) -> Result<u64, Error> {
        if self.pre_longs != PREAMBLE_LONGS_EMPTY {
            return Err(Error::invalid_preamble_longs(PREAMBLE_LONGS_EMPTY, self.pre_longs));
        }
        if bytes.len() < 16 {
            return Err(Error::insufficient_data_of(
                "single-item hash",
                format!("need 16 bytes, got {}", bytes.len()),
            ));
        }
        Ok(u64::from_le_bytes(bytes[8..16].try_into().unwrap()))
    }

    /// Returns `(curCount, thetaLong, entriesOffset)` for a non-empty,
    /// non-single-item SerVer 3 image.
    fn v3_body(&self, bytes: &[u8]) -> Result<(usize, u64, usize), Error> {
        if bytes.len() < 16 {
            return Err(Error::insufficient_data_of(
                "compact preamble",
                format!("need 16 bytes, got {}", bytes.len()),
            ));
        }
        let cur_count = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        if self.is_empty && cur_count != 0 {
            return Err(Error::empty_with_nonzero_count(cur_count));
        }
        let (theta, entries_offset) = if self.pre_longs >= PREAMBLE_LONGS_ESTIMATION {
            if bytes.len() < 24 {
                return Err(Error::insufficient_data_of(
                    "thetaLong",
                    format!("need 24 bytes, got {}", bytes.len()),
                ));
            }
            (u64::from_le_bytes(bytes[16..24].try_into().unwrap()), 24)
        } else {
            (MAX_THETA, 16)
        };
        if theta == 0 {
            return Err(Error::theta_corruption(theta));
        }
        Ok((cur_count, theta, entries_offset))
    }

    /// Returns `(thetaLong, numEntries, entriesOffset, entryBits)` for a
    /// non-empty SerVer 4 image.
    fn v4_body(&self, bytes: &[u8]) -> Result<(u64, usize, usize, u8), Error> {
        let estimating = self.pre_longs >= PREAMBLE_LONGS_ESTIMATION;
        let (theta, mut offset) = if estimating {
            if bytes.len() < 16 {
                return Err(Error::insufficient_data_of(
                    "thetaLong",
                    format!("need 16 bytes, got {}", bytes.len()),
                ));
            }
            (u64::from_le_bytes(bytes[8..16].try_into().unwrap()), 16)
        } else {
            (MAX_THETA, 8)
        };
        if theta == 0 {
            return Err(Error::theta_corruption(theta));
        }
        if bytes.len() < offset + self.num_entries_bytes {
            return Err(Error::insufficient_data_of(
                "retained-entries count",
                format!("need {} bytes, got {}", offset + self.num_entries_bytes, bytes.len()),
            ));
        }
        let mut count_buf = [0u8; 8];
        count_buf[..self.num_entries_bytes].copy_from_slice(&bytes[offset..offset + self.num_entries_bytes]);
        let count = u64::from_le_bytes(count_buf) as usize;
        offset += self.num_entries_bytes;
        Ok((theta, count, offset, self.entry_bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_hash() -> u16 {
        compute_seed_hash(super::super::DEFAULT_UPDATE_SEED)
    }

    #[test]
    fn test_empty_serializes_to_canonical_image() {
        let sketch = CompactThetaSketch::Empty {
            seed_hash: seed_hash(),
        };
        assert_eq!(
            sketch.serialize(),
            vec![0x01, 0x03, 0x03, 0x00, 0x00, 0x1E, 0x00, 0x00]
        );
    }

    #[test]
    fn test_single_item_round_trip() {
        let sketch = CompactThetaSketch::SingleItem {
            hash: 0x1122_3344_5566_7788,
            seed_hash: seed_hash(),
        };
        let bytes = sketch.serialize();
        assert_eq!(bytes.len(), 16);
        let back = CompactThetaSketch::deserialize(&bytes).unwrap();
        assert!(back.is_single_item());
        assert_eq!(back.num_retained(), 1);
        assert_eq!(back.iter_hashes().collect::<Vec<_>>(), vec![0x1122_3344_5566_7788]);
    }

    #[test]
    fn test_exact_mode_serialized_size_matches_scenario() {
        let entries: Vec<u64> = (1..=100).collect();
        let sketch = CompactThetaSketch::from_parts(MAX_THETA, seed_hash(), true, entries);
        assert_eq!(sketch.serialize().len(), 24 + 8 * 100);
    }

    #[test]
    fn test_v3_round_trip_preserves_hashes_and_theta() {
        let entries: Vec<u64> = vec![10, 20, 5, 99];
        let sketch = CompactThetaSketch::from_parts(0x7000_0000_0000_0000, seed_hash(), true, entries.clone());
        let bytes = sketch.serialize();
        let back = CompactThetaSketch::deserialize(&bytes).unwrap();
        let mut expected = entries;
        expected.sort_unstable();
        assert_eq!(back.iter_hashes().collect::<Vec<_>>(), expected);
        assert_eq!(back.theta_long(), 0x7000_0000_0000_0000);
    }

    #[test]
    fn test_compressed_round_trip_matches_s6_scenario() {
        let theta = 0x00FF_FFFF_FFFF_FFFFu64;
        let entries: Vec<u64> = (1u64..=100).map(|i| i * (theta / 200)).collect();
        let sketch = CompactThetaSketch::from_parts(theta, seed_hash(), true, entries.clone());
        let compressed = sketch.serialize_compressed();
        // entryBits=56, numEntriesBytes=1: 6-byte fixed prefix + 1 count byte
        // + 8-byte theta + 700 packed bytes.
        assert_eq!(compressed.len(), 6 + 2 + 8 + 1 + 700);
        let back = CompactThetaSketch::deserialize(&compressed).unwrap();
        let mut expected = entries;
        expected.sort_unstable();
        assert_eq!(back.iter_hashes().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_wrap_is_zero_copy_and_matches_owned_decode() {
        let entries: Vec<u64> = vec![7, 3, 500, 42];
        let sketch = CompactThetaSketch::from_parts(MAX_THETA, seed_hash(), true, entries);
        let bytes = sketch.serialize();
        let wrapped = CompactThetaSketch::wrap(&bytes, super::super::DEFAULT_UPDATE_SEED).unwrap();
        let owned = CompactThetaSketch::deserialize(&bytes).unwrap();
        assert_eq!(
            wrapped.iter_hashes().collect::<Vec<_>>(),
            owned.iter_hashes().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_seed_hash_mismatch_is_rejected() {
        let sketch = CompactThetaSketch::Empty {
            seed_hash: seed_hash(),
        };
        let bytes = sketch.serialize();
        let result = CompactThetaSketch::deserialize_with_seed(&bytes, super::super::DEFAULT_UPDATE_SEED + 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_degenerate_zero_count_with_theta_below_one_is_not_empty() {
        let sketch = CompactThetaSketch::from_parts(0x4000_0000_0000_0000, seed_hash(), true, vec![]);
        assert!(!sketch.is_empty());
        assert_eq!(sketch.num_retained(), 0);
        assert_eq!(sketch.estimate(), 0.0);
    }
}
