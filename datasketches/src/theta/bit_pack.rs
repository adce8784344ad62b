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

//! Bit-packing codec used by SerVer 4 (compressed ordered compact sketches).
//!
//! Every stored value fits in `entryBits` bits, `1 <= entryBits <= 63`. Two
//! paths exist: a single-entry path that reads or writes one value at an
//! arbitrary bit offset, and a block path that does eight values at a time.
//! The block path is what callers use while eight or more entries remain,
//! falling back to the single-entry path for the tail.

pub(super) const BLOCK_SIZE: usize = 8;

/// Packs values at an arbitrary bit offset, one entry at a time.
pub(super) struct BitPacker<'a> {
    bytes: &'a mut [u8],
    byte_index: usize,
    bit_offset: u8,
}

impl<'a> BitPacker<'a> {
    pub(super) fn new(bytes: &'a mut [u8]) -> Self {
        Self {
            bytes,
            byte_index: 0,
            bit_offset: 0,
        }
    }

    pub(super) fn bytes_used(&self) -> usize {
        self.byte_index + if self.bit_offset > 0 { 1 } else { 0 }
    }

    /// Writes the low `bits` bits of `value`, advancing the cursor by `bits`.
    pub(super) fn pack_value(&mut self, value: u64, bits: u8) {
        let mut remaining = bits;
        let mut value = value;
        while remaining > 0 {
            let free_in_byte = 8 - self.bit_offset;
            let take = remaining.min(free_in_byte);
            let chunk = (value & ((1u64 << take) - 1)) as u8;
            self.bytes[self.byte_index] |= chunk << self.bit_offset;

            value >>= take;
            remaining -= take;
            self.bit_offset += take;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_index += 1;
            }
        }
    }
}

/// Unpacks values at an arbitrary bit offset, one entry at a time.
pub(super) struct BitUnpacker<'a> {
    bytes: &'a [u8],
    byte_index: usize,
    bit_offset: u8,
}

impl<'a> BitUnpacker<'a> {
    pub(super) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            byte_index: 0,
            bit_offset: 0,
        }
    }

    pub(super) fn unpack_value(&mut self, bits: u8) -> u64 {
        let mut remaining = bits;
        let mut result: u64 = 0;
        let mut result_shift = 0u8;
        while remaining > 0 {
            let free_in_byte = 8 - self.bit_offset;
            let take = remaining.min(free_in_byte);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (self.bytes[self.byte_index] >> self.bit_offset) & mask;
            result |= (chunk as u64) << result_shift;

            result_shift += take;
            remaining -= take;
            self.bit_offset += take;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_index += 1;
            }
        }
        result
    }
}

/// Packs exactly [`BLOCK_SIZE`] values, each fitting in `bits` bits, into
/// `ceil(8 * bits / 8)` bytes of `dst`. `dst` must already be zeroed.
pub(super) fn pack_block8(values: &[u64; BLOCK_SIZE], bits: u8, dst: &mut [u8]) {
    let mut packer = BitPacker::new(dst);
    for &v in values {
        packer.pack_value(v, bits);
    }
}

/// Inverse of [`pack_block8`].
pub(super) fn unpack_block8(src: &[u8], bits: u8) -> [u64; BLOCK_SIZE] {
    let mut unpacker = BitUnpacker::new(src);
    let mut out = [0u64; BLOCK_SIZE];
    for slot in out.iter_mut() {
        *slot = unpacker.unpack_value(bits);
    }
    out
}

/// Number of bytes needed to hold `num_entries` values of `bits` bits each.
pub(super) fn packed_bytes_needed(num_entries: usize, bits: u8) -> usize {
    (num_entries * bits as usize).div_ceil(8)
}

/// Packs `values` (of arbitrary length, not just a multiple of 8) into `dst`,
/// using the block-8 path while 8 or more entries remain and the single-entry
/// path for the remainder. `dst` must be zeroed and at least
/// [`packed_bytes_needed`] bytes long.
pub(super) fn pack_all(values: &[u64], bits: u8, dst: &mut [u8]) {
    let mut chunks = values.chunks_exact(BLOCK_SIZE);
    let mut offset_bytes = 0usize;
    let block_bytes = packed_bytes_needed(BLOCK_SIZE, bits);
    for chunk in &mut chunks {
        let block: [u64; BLOCK_SIZE] = chunk.try_into().unwrap();
        pack_block8(&block, bits, &mut dst[offset_bytes..offset_bytes + block_bytes]);
        offset_bytes += block_bytes;
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut packer = BitPacker::new(&mut dst[offset_bytes..]);
        for &v in tail {
            packer.pack_value(v, bits);
        }
    }
}

/// Inverse of [`pack_all`]; unpacks exactly `num_entries` values of `bits` bits
/// each from `src`.
pub(super) fn unpack_all(src: &[u8], bits: u8, num_entries: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(num_entries);
    let block_bytes = packed_bytes_needed(BLOCK_SIZE, bits);
    let full_blocks = num_entries / BLOCK_SIZE;
    let mut offset_bytes = 0usize;
    for _ in 0..full_blocks {
        let block = unpack_block8(&src[offset_bytes..offset_bytes + block_bytes], bits);
        out.extend_from_slice(&block);
        offset_bytes += block_bytes;
    }
    let remaining = num_entries - out.len();
    if remaining > 0 {
        let mut unpacker = BitUnpacker::new(&src[offset_bytes..]);
        for _ in 0..remaining {
            out.push(unpacker.unpack_value(bits));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry_round_trip_all_widths() {
        for bits in 1u8..=63 {
            let max = if bits == 63 {
                u64::MAX >> 1
            } else {
                (1u64 << bits) - 1
            };
            let values = [0u64, 1, max / 2, max];
            let total_bits = values.len() * bits as usize;
            let mut buf = vec![0u8; total_bits.div_ceil(8)];
            let mut packer = BitPacker::new(&mut buf);
            for &v in &values {
                packer.pack_value(v, bits);
            }
            let mut unpacker = BitUnpacker::new(&buf);
            for &v in &values {
                assert_eq!(unpacker.unpack_value(bits), v, "bits={bits}");
            }
        }
    }

    #[test]
    fn test_block8_round_trip() {
        for bits in [1u8, 7, 8, 13, 32, 56, 63] {
            let max = if bits == 63 {
                u64::MAX >> 1
            } else {
                (1u64 << bits) - 1
            };
            let values: [u64; BLOCK_SIZE] = [
                0,
                1,
                max,
                max / 3,
                max / 2,
                max - 1,
                2,
                max / 7,
            ];
            let mut buf = vec![0u8; packed_bytes_needed(BLOCK_SIZE, bits)];
            pack_block8(&values, bits, &mut buf);
            let round_tripped = unpack_block8(&buf, bits);
            assert_eq!(round_tripped, values, "bits={bits}");
        }
    }

    #[test]
    fn test_pack_all_with_non_multiple_of_8_len() {
        let bits = 17u8;
        let values: Vec<u64> = (0..19).map(|i| (i * 12345) % (1u64 << bits)).collect();
        let mut buf = vec![0u8; packed_bytes_needed(values.len(), bits)];
        pack_all(&values, bits, &mut buf);
        let round_tripped = unpack_all(&buf, bits, values.len());
        assert_eq!(round_tripped, values);
    }

    #[test]
    fn test_packed_bytes_needed_matches_spec_scenario() {
        // S6: 100 entries at 56 bits each.
        assert_eq!(packed_bytes_needed(100, 56), 700);
    }
}
