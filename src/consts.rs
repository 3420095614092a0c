//! Layout constants shared across the bit, page, hashing and relation layers.

/// Width of the bit vector used for composite hashes and bucket/page IDs.
pub const MAXBITS: u32 = 32;

/// Number of choice-vector entries; always equal to [`MAXBITS`] (one entry
/// per composite-hash bit position).
pub const MAXCHVEC: usize = MAXBITS as usize;

/// Sentinel page ID meaning "no such page / end of overflow chain".
pub const NO_PAGE: u32 = u32::MAX;

/// Default on-disk page size in bytes.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Per-page header: `ntuples(u32) + free(u32) + ovflow(u32)`.
pub const PAGE_HDR_SIZE: usize = 12;

/// `.info` file magic.
pub const INFO_MAGIC: &[u8; 8] = b"MALHF001";

pub const INFO_FILE_EXT: &str = "info";
pub const DATA_FILE_EXT: &str = "data";
pub const OVFLOW_FILE_EXT: &str = "ovflow";

/// Width, in bytes, of a single count-sized field in the `.info` header.
pub const COUNT_SIZE: usize = 4;

/// Fixed `.info` header size: `nattrs, depth, sp, npages` then `ntups` as u64,
/// followed by `MAXCHVEC` choice-vector entries of `(attr: u32, bit: u32)`.
pub const INFO_FIXED_FIELDS_SIZE: usize = COUNT_SIZE * 4 + 8;
pub const INFO_CHVEC_SIZE: usize = MAXCHVEC * (COUNT_SIZE * 2);
pub const INFO_HDR_SIZE: usize = INFO_MAGIC.len() + INFO_FIXED_FIELDS_SIZE + INFO_CHVEC_SIZE;
