//! Relation layer: owns the three on-disk files, the global state
//! `(depth, sp, npages, ntups, nattrs, choice vector)`, and the lifecycle
//! operations (`create`/`open`/`close`). Insertion, overflow handling and
//! the linear-hash split live in [`insert`]; statistics in [`stats`].
//!
//! Grounded on the teacher's `dir.rs`/`meta.rs` atomic tmp+rename header
//! writes and `db/core.rs`'s `Db` struct owning its file handles directly
//! (no process-wide state, per spec.md §9's Design Notes).

mod header;
mod insert;
mod stats;

pub use stats::RelationStats;

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use crate::bits::{get_lower, Bits};
use crate::chvec::{parse_chvec, ChVecItem};
use crate::config::RelationConfig;
use crate::consts::{DATA_FILE_EXT, INFO_FILE_EXT, OVFLOW_FILE_EXT};
use crate::error::{MalhfError, Result};
use crate::hash::{tuple_hash, HashKind, HASH_KIND_DEFAULT};
use crate::page::{self, Page};
use crate::tuple::split_attrs;

/// Open mode, mirroring the original's `mode == 'w' | 'r'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

pub struct Relation {
    pub(crate) name: String,
    pub(crate) nattrs: u32,
    pub(crate) depth: u32,
    pub(crate) sp: u32,
    pub(crate) npages: u32,
    pub(crate) ntups: u64,
    pub(crate) chvec: Vec<ChVecItem>,
    pub(crate) hash_kind: HashKind,
    pub(crate) mode: Mode,
    pub(crate) config: RelationConfig,

    // No persistent `.info` handle: every header rewrite goes through the
    // tmp+rename idiom in `header.rs`, which replaces the file's identity
    // on disk, so the header is read/written by path instead.
    pub(crate) data: File,
    pub(crate) ovflow: File,
}

fn file_path(name: &str, ext: &str) -> PathBuf {
    PathBuf::from(format!("{name}.{ext}"))
}

impl Relation {
    /// Does a relation of this name already exist (an `.info` file present)?
    pub fn exists(name: &str) -> bool {
        file_path(name, INFO_FILE_EXT).exists()
    }

    /// `newRelation`: create the three files, parse the choice vector, write
    /// `initial_npages` empty primary pages, persist the header.
    pub fn create(
        name: &str,
        nattrs: u32,
        initial_npages: u32,
        depth: u32,
        chvec_spec: &str,
        config: RelationConfig,
    ) -> Result<Relation> {
        if nattrs == 0 {
            return Err(MalhfError::BadChoiceVector(
                "nattrs must be >= 1".to_string(),
            ));
        }
        if Self::exists(name) {
            return Err(MalhfError::RelationExists(name.to_string()));
        }
        let chvec = parse_chvec(chvec_spec, nattrs)?;

        let data_path = file_path(name, DATA_FILE_EXT);
        let ovflow_path = file_path(name, OVFLOW_FILE_EXT);

        let mut data = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(&data_path)?;
        let ovflow = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(&ovflow_path)?;

        for _ in 0..initial_npages {
            page::add_page(&mut data, config.page_size as usize)?;
        }

        let mut rel = Relation {
            name: name.to_string(),
            nattrs,
            depth,
            sp: 0,
            npages: initial_npages,
            ntups: 0,
            chvec,
            hash_kind: HASH_KIND_DEFAULT,
            mode: Mode::Write,
            config,
            data,
            ovflow,
        };
        // First write of the `.info` file: tmp+rename creates it, there is
        // nothing to "overwrite" yet (RELATION_EXISTS was already checked
        // above via `Self::exists`).
        rel.flush_header()?;
        log::info!(
            "created relation '{name}': nattrs={nattrs} depth={depth} npages={initial_npages}"
        );
        Ok(rel)
    }

    /// `openRelation`: read the header, open the other two files.
    pub fn open(name: &str, mode: Mode, config: RelationConfig) -> Result<Relation> {
        if !Self::exists(name) {
            return Err(MalhfError::NoSuchRelation(name.to_string()));
        }

        let data = OpenOptions::new()
            .read(true)
            .write(mode == Mode::Write)
            .open(file_path(name, DATA_FILE_EXT))?;
        let ovflow = OpenOptions::new()
            .read(true)
            .write(mode == Mode::Write)
            .open(file_path(name, OVFLOW_FILE_EXT))?;

        let (nattrs, depth, sp, npages, ntups, chvec) =
            header::read_header(&file_path(name, INFO_FILE_EXT))?;

        Ok(Relation {
            name: name.to_string(),
            nattrs,
            depth,
            sp,
            npages,
            ntups,
            chvec,
            hash_kind: HASH_KIND_DEFAULT,
            mode,
            config,
            data,
            ovflow,
        })
    }

    /// `closeRelation`: if writable, rewrite the header; release the
    /// descriptor. Consumes `self` so a closed relation cannot be reused.
    pub fn close(mut self) -> Result<()> {
        if self.mode == Mode::Write {
            self.flush_header()?;
        }
        log::debug!("closed relation '{}'", self.name);
        Ok(())
    }

    pub(crate) fn flush_header(&mut self) -> Result<()> {
        header::write_header(
            &file_path(&self.name, INFO_FILE_EXT),
            self.nattrs,
            self.depth,
            self.sp,
            self.npages,
            self.ntups,
            &self.chvec,
        )
    }

    /// Used only by [`Drop`]: a best-effort re-flush for a relation that is
    /// dropped without going through [`Relation::close`] (e.g. the caller
    /// bailed out via `?` on an earlier error). `close` itself already
    /// flushes and this path never runs on that route, since `close`
    /// consumes `self`.
    fn flush_header_best_effort(&mut self) {
        let _ = self.flush_header();
    }

    // -------- accessors --------

    pub fn nattrs(&self) -> u32 {
        self.nattrs
    }
    pub fn npages(&self) -> u32 {
        self.npages
    }
    pub fn ntuples(&self) -> u64 {
        self.ntups
    }
    pub fn depth(&self) -> u32 {
        self.depth
    }
    pub fn splitp(&self) -> u32 {
        self.sp
    }
    pub fn chvec(&self) -> &[ChVecItem] {
        &self.chvec
    }
    pub fn hash_kind(&self) -> HashKind {
        self.hash_kind
    }
    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }
    pub fn data_path(&self) -> PathBuf {
        file_path(&self.name, DATA_FILE_EXT)
    }
    pub fn ovflow_path(&self) -> PathBuf {
        file_path(&self.name, OVFLOW_FILE_EXT)
    }

    // -------- addressing (§4.4) --------

    pub(crate) fn tuple_hash_of(&self, tuple: &str) -> Result<Bits> {
        let attrs = split_attrs(tuple, self.nattrs)?;
        let attr_bytes: Vec<&[u8]> = attrs.iter().map(|s| s.as_bytes()).collect();
        Ok(tuple_hash(self.hash_kind, &self.chvec, &attr_bytes))
    }

    /// Primary address: `getLower(H, d)`, re-addressed with `d+1` if it
    /// falls in the already-split range `[0, sp)`.
    pub(crate) fn primary_address(&self, hash: Bits) -> u32 {
        let mut p = get_lower(hash, self.depth);
        if p < self.sp {
            p = get_lower(hash, self.depth + 1);
        }
        p
    }

    /// Split-time address: always `getLower(H, d+1)`.
    pub(crate) fn split_time_address(&self, hash: Bits) -> u32 {
        get_lower(hash, self.depth + 1)
    }

    pub(crate) fn page_capacity(&self) -> usize {
        Page::capacity(self.config.page_size as usize)
    }
}

/// Best-effort header flush on drop, matching the teacher's `impl Drop for
/// Db` pattern: a relation abandoned after a mid-operation error (instead of
/// going through the normal `close()`) still gets its last-known-good
/// `(d, sp, npages, ntups)` persisted rather than whatever was on disk from
/// the previous flush. Errors are swallowed here, same as the teacher's
/// `Drop` impl — there is no caller left to report them to.
impl Drop for Relation {
    fn drop(&mut self) {
        if self.mode == Mode::Write {
            self.flush_header_best_effort();
        }
    }
}
