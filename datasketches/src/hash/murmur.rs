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

use std::hash::Hasher;

/// The 128-bit variant of MurmurHash3 used by DataSketches for item fingerprinting
/// and for deriving the 16-bit seed hash embedded in every serialized image.
///
/// `mur3::murmurhash3_x64_128` hashes a whole byte slice at once, so this type
/// buffers everything written through the `Hasher` interface and only computes
/// the digest on `finish128`.
#[derive(Debug, Clone)]
pub struct MurmurHash3X64128 {
    seed: u64,
    buffer: Vec<u8>,
}

impl MurmurHash3X64128 {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            buffer: Vec::new(),
        }
    }

    /// Returns the full 128-bit digest as two 64-bit words, `(h1, h2)`.
    pub fn finish128(&self) -> (u64, u64) {
        mur3::murmurhash3_x64_128(&self.buffer, self.seed)
    }
}

impl Hasher for MurmurHash3X64128 {
    fn finish(&self) -> u64 {
        self.finish128().0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }
}

/// Hashes a single 64-bit item value the way the update sketch hashes incoming
/// items before admitting them: little-endian bytes of `item` through MurmurHash3
/// x64/128, keeping only `h1`, shifted right one bit so the result always fits in
/// a signed 63-bit range (matching the Java reference implementation, which
/// discards the sign bit of a `long`).
pub fn hash_u64_item(item: u64, seed: u64) -> u64 {
    let mut hasher = MurmurHash3X64128::with_seed(seed);
    hasher.write(&item.to_le_bytes());
    let (h1, _) = hasher.finish128();
    h1 >> 1
}

/// Hashes arbitrary bytes the same way as [`hash_u64_item`], for string/byte-slice
/// item types.
pub fn hash_bytes_item(bytes: &[u8], seed: u64) -> u64 {
    let mut hasher = MurmurHash3X64128::with_seed(seed);
    hasher.write(bytes);
    let (h1, _) = hasher.finish128();
    h1 >> 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder() {
        let key = "The quick brown fox jumps over the lazy dog";
        let (h1, h2) = mur3::murmurhash3_x64_128(key.as_bytes(), 0);
        assert_eq!(h1, 0xe34bbc7bbc071b6c);
        assert_eq!(h2, 0x7a433ca9c49a9347);

        let key = "The quick brown fox jumps over the lazy eog";
        let (h1, h2) = mur3::murmurhash3_x64_128(key.as_bytes(), 0);
        assert_eq!(h1, 0x362108102c62d1c9);
        assert_eq!(h2, 0x3285cd100292b305);

        let key = "The quick brown fox jumps over the lazy dogdogdog";
        let (h1, h2) = mur3::murmurhash3_x64_128(key.as_bytes(), 0);
        assert_eq!(h1, 0x9c8205300e612fc4);
        assert_eq!(h2, 0xcbc0af6136aa3df9);
    }

    #[test]
    fn test_hasher_matches_direct_call() {
        let mut hasher = MurmurHash3X64128::with_seed(0);
        hasher.write(b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            hasher.finish128(),
            mur3::murmurhash3_x64_128(b"The quick brown fox jumps over the lazy dog", 0)
        );
    }

    #[test]
    fn test_hash_u64_item_is_deterministic() {
        let a = hash_u64_item(12345, 0);
        let b = hash_u64_item(12345, 0);
        assert_eq!(a, b);
        assert_ne!(a, hash_u64_item(12346, 0));
    }
}
