//! Hashing layer: a stable byte-string hash plus the choice-vector-driven
//! composite tuple hash.
//!
//! A named [`HashKind`] enum is recorded alongside the relation header
//! rather than hard-coding a single hash function, so a second kind could be
//! added later without breaking the on-disk format.

use twox_hash::XxHash32;
use std::hash::Hasher;

use crate::bits::{bit_is_set, set_bit, Bits};
use crate::chvec::ChVecItem;
use crate::consts::MAXBITS;

/// Stable hash kind used to turn a byte string into a full-width [`Bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// 32-bit xxhash with seed=0. Matches `MAXBITS == 32` one-to-one.
    Xx32Seed0 = 1,
}

impl HashKind {
    pub fn to_u32(self) -> u32 {
        match self {
            HashKind::Xx32Seed0 => 1,
        }
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            1 => Some(HashKind::Xx32Seed0),
            _ => None,
        }
    }
}

pub const HASH_KIND_DEFAULT: HashKind = HashKind::Xx32Seed0;

/// `hash_any(bytes) -> bits`: deterministic, uniform enough for composite
/// hashes to distribute uniformly across buckets.
pub fn hash_any(kind: HashKind, bytes: &[u8]) -> Bits {
    match kind {
        HashKind::Xx32Seed0 => {
            let mut h = XxHash32::with_seed(0);
            h.write(bytes);
            h.finish() as u32
        }
    }
}

/// Compute the composite hash of a tuple already split into `nattrs`
/// attribute byte strings, per the choice vector: bit `j` of the result is
/// bit `ChV[j].bit` of `hash_any(attrs[ChV[j].attr])`.
pub fn tuple_hash(kind: HashKind, chvec: &[ChVecItem], attrs: &[&[u8]]) -> Bits {
    let attr_hashes: Vec<Bits> = attrs.iter().map(|a| hash_any(kind, a)).collect();
    composite_hash(chvec, |attr_idx| attr_hashes[attr_idx])
}

/// Shared bit-interleaving step used by both tuple hashing (§4.3) and query
/// known/unknown decomposition (§4.6): given a way to fetch the per-attribute
/// hash for an attribute index, build the `MAXBITS`-wide composite value.
pub fn composite_hash<F: Fn(usize) -> Bits>(chvec: &[ChVecItem], attr_hash: F) -> Bits {
    let mut result: Bits = 0;
    for j in 0..MAXBITS {
        let item = &chvec[j as usize];
        let h = attr_hash(item.attr as usize);
        if bit_is_set(h, item.bit) {
            result = set_bit(result, j);
        }
    }
    result
}
