//! `.info` header (de)serialization.
//!
//! The original C persists the first five fields by `fread`/`fwrite`-ing the
//! descriptor's raw memory, "naughty": it relies on `Count` and `Offset`
//! being the same width (spec.md §9). This reimplementation serialises each
//! field explicitly, field by field, in a canonical little-endian order —
//! the fix spec.md §9 calls for.
//!
//! Writes go through the teacher's tmp+rename(+fsync) idiom
//! (`examples/artemonad-QuiverDB/src/meta.rs`'s `write_meta_new`/
//! `write_meta_overwrite`): every rewrite of the live `.info` file is built
//! up in a sibling `.info.tmp`, `sync_all`'d, then atomically renamed over
//! the live file, so a crash mid-write can never leave a half-written
//! header. Because the rename swaps the live file's identity rather than
//! reusing the caller's open handle, the relation does not keep a
//! persistent `.info` file handle open; it reads/writes by path.

use byteorder::{ByteOrder, LittleEndian};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::chvec::ChVecItem;
use crate::consts::{INFO_HDR_SIZE, INFO_MAGIC, MAXCHVEC};
use crate::error::{MalhfError, Result};

type Header = (u32, u32, u32, u32, u64, Vec<ChVecItem>);

#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    std::path::PathBuf::from(name)
}

pub fn read_header(path: &Path) -> Result<Header> {
    let mut info = OpenOptions::new().read(true).open(path)?;
    let mut buf = vec![0u8; INFO_HDR_SIZE];
    info.read_exact(&mut buf)?;

    if &buf[0..8] != INFO_MAGIC {
        return Err(MalhfError::corrupt("bad .info magic"));
    }
    let mut off = 8;
    let nattrs = LittleEndian::read_u32(&buf[off..off + 4]);
    off += 4;
    let depth = LittleEndian::read_u32(&buf[off..off + 4]);
    off += 4;
    let sp = LittleEndian::read_u32(&buf[off..off + 4]);
    off += 4;
    let npages = LittleEndian::read_u32(&buf[off..off + 4]);
    off += 4;
    let ntups = LittleEndian::read_u64(&buf[off..off + 8]);
    off += 8;

    let mut chvec = Vec::with_capacity(MAXCHVEC);
    for _ in 0..MAXCHVEC {
        let attr = LittleEndian::read_u32(&buf[off..off + 4]);
        off += 4;
        let bit = LittleEndian::read_u32(&buf[off..off + 4]);
        off += 4;
        chvec.push(ChVecItem { attr, bit });
    }

    if npages != (1u32 << depth).wrapping_add(sp) {
        return Err(MalhfError::corrupt(format!(
            "npages invariant violated: npages={npages}, depth={depth}, sp={sp}"
        )));
    }

    Ok((nattrs, depth, sp, npages, ntups, chvec))
}

/// Atomically (re)write the `.info` file at `path`: build the header in a
/// sibling `.tmp` file, `sync_all` it, then `rename` it over `path`. Used
/// both to create a brand-new `.info` file and to overwrite an existing one
/// after every mutating relation operation.
pub fn write_header(
    path: &Path,
    nattrs: u32,
    depth: u32,
    sp: u32,
    npages: u32,
    ntups: u64,
    chvec: &[ChVecItem],
) -> Result<()> {
    debug_assert_eq!(
        npages,
        (1u32 << depth) + sp,
        "npages must equal (1<<depth)+sp before persisting"
    );
    debug_assert_eq!(chvec.len(), MAXCHVEC);

    let mut buf = vec![0u8; INFO_HDR_SIZE];
    buf[0..8].copy_from_slice(INFO_MAGIC);
    let mut off = 8;
    LittleEndian::write_u32(&mut buf[off..off + 4], nattrs);
    off += 4;
    LittleEndian::write_u32(&mut buf[off..off + 4], depth);
    off += 4;
    LittleEndian::write_u32(&mut buf[off..off + 4], sp);
    off += 4;
    LittleEndian::write_u32(&mut buf[off..off + 4], npages);
    off += 4;
    LittleEndian::write_u64(&mut buf[off..off + 8], ntups);
    off += 8;
    for item in chvec {
        LittleEndian::write_u32(&mut buf[off..off + 4], item.attr);
        off += 4;
        LittleEndian::write_u32(&mut buf[off..off + 4], item.bit);
        off += 4;
    }

    let tmp = tmp_path(path);
    let _ = fs::remove_file(&tmp); // best-effort: a stale tmp from a prior crash

    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    f.write_all(&buf)?;
    f.sync_all()?; // ensure tmp is durable before the rename makes it live

    fs::rename(&tmp, path)?;
    let _ = fsync_dir(path); // best-effort directory-entry durability

    Ok(())
}
