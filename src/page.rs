//! Page layer: in-memory page image plus read/write to a page-indexed file.
//!
//! A page is a plain struct materialised by `read_page`, mutated in place,
//! and handed back to `write_page`. On-disk layout: header
//! `(ntuples: u32, free: u32, ovflow: u32)` then body bytes, each tuple a
//! null-terminated byte string written contiguously.

use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::consts::{NO_PAGE, PAGE_HDR_SIZE};
use crate::error::Result;

/// Result of [`add_to_page`]: whether the tuple was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    Added,
    Full,
}

/// An in-memory page image. `body` holds only the occupied tuple bytes
/// (length `capacity() - free`); `add` appends to its end and `write_page`
/// zero-pads the rest back out to `capacity()` on disk.
#[derive(Debug, Clone)]
pub struct Page {
    page_size: usize,
    ntuples: u32,
    free: u32,
    ovflow: u32,
    /// Tuple bytes packed contiguously, each terminated with `\0`.
    /// Length of the occupied prefix is `capacity() - free as usize`.
    body: Vec<u8>,
}

impl Page {
    /// Body capacity in bytes for a page of `page_size` total bytes.
    pub fn capacity(page_size: usize) -> usize {
        page_size - PAGE_HDR_SIZE
    }

    /// A fresh, empty page image.
    pub fn new(page_size: usize) -> Self {
        let capacity = Self::capacity(page_size);
        Page {
            page_size,
            ntuples: 0,
            free: capacity as u32,
            ovflow: NO_PAGE,
            body: Vec::with_capacity(capacity),
        }
    }

    pub fn n_tuples(&self) -> u32 {
        self.ntuples
    }

    pub fn free_space(&self) -> u32 {
        self.free
    }

    pub fn ovflow(&self) -> u32 {
        self.ovflow
    }

    pub fn set_ovflow(&mut self, page_id: u32) {
        self.ovflow = page_id;
    }

    /// Raw tuple bytes: a sequence of null-terminated strings.
    pub fn data(&self) -> &[u8] {
        &self.body
    }

    /// Iterate the tuples stored on this page, in on-page order.
    pub fn tuples(&self) -> PageTupleIter<'_> {
        PageTupleIter {
            body: &self.body,
            offset: 0,
            remaining: self.ntuples,
        }
    }

    /// Append `tuple` (must contain no embedded nulls) if it fits.
    pub fn add(&mut self, tuple: &str) -> AddResult {
        let needed = tuple.len() + 1; // + null terminator
        if needed > self.free as usize {
            return AddResult::Full;
        }
        self.body.extend_from_slice(tuple.as_bytes());
        self.body.push(0);
        self.free -= needed as u32;
        self.ntuples += 1;
        AddResult::Added
    }
}

pub struct PageTupleIter<'a> {
    body: &'a [u8],
    offset: usize,
    remaining: u32,
}

impl<'a> Iterator for PageTupleIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.remaining == 0 {
            return None;
        }
        let rest = &self.body[self.offset..];
        let nul = rest.iter().position(|&b| b == 0)?;
        let s = std::str::from_utf8(&rest[..nul]).ok()?;
        self.offset += nul + 1;
        self.remaining -= 1;
        Some(s)
    }
}

/// Read page `page_id` (0-based ordinal) from `file`.
pub fn read_page(file: &mut File, page_id: u32, page_size: usize) -> Result<Page> {
    let mut buf = vec![0u8; page_size];
    file.seek(SeekFrom::Start(page_id as u64 * page_size as u64))?;
    file.read_exact(&mut buf)?;

    let ntuples = LittleEndian::read_u32(&buf[0..4]);
    let free = LittleEndian::read_u32(&buf[4..8]);
    let ovflow = LittleEndian::read_u32(&buf[8..12]);
    // `body` holds only the occupied prefix: `add()` appends to its end and
    // `write_page` re-pads to `page_size` from `body.len()`, so carrying the
    // zero-padded tail here would make every subsequent `add` grow `body`
    // past `capacity` and panic in `write_page`'s slice index.
    let capacity = Page::capacity(page_size);
    let occupied = capacity - free as usize;
    let body = buf[PAGE_HDR_SIZE..PAGE_HDR_SIZE + occupied].to_vec();

    Ok(Page {
        page_size,
        ntuples,
        free,
        ovflow,
        body,
    })
}

/// Write `page` back to ordinal `page_id` in `file`.
pub fn write_page(file: &mut File, page_id: u32, page: &Page) -> Result<()> {
    let mut buf = vec![0u8; page.page_size];
    LittleEndian::write_u32(&mut buf[0..4], page.ntuples);
    LittleEndian::write_u32(&mut buf[4..8], page.free);
    LittleEndian::write_u32(&mut buf[8..12], page.ovflow);
    buf[PAGE_HDR_SIZE..PAGE_HDR_SIZE + page.body.len()].copy_from_slice(&page.body);

    file.seek(SeekFrom::Start(page_id as u64 * page.page_size as u64))?;
    file.write_all(&buf)?;
    Ok(())
}

/// Append a fresh empty page to `file`, returning its new ordinal.
pub fn add_page(file: &mut File, page_size: usize) -> Result<u32> {
    let len = file.seek(SeekFrom::End(0))?;
    debug_assert_eq!(len % page_size as u64, 0, "file length not page-aligned");
    let page_id = (len / page_size as u64) as u32;
    let page = Page::new(page_size);
    write_page(file, page_id, &page)?;
    Ok(page_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Seek;

    fn tmp_file() -> File {
        let path = std::env::temp_dir().join(format!(
            "malhf-page-test-{}-{}",
            std::process::id(),
            nanos()
        ));
        std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)
            .unwrap()
    }

    fn nanos() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    }

    #[test]
    fn add_and_iterate() {
        let mut p = Page::new(64);
        assert_eq!(p.add("apple,red"), AddResult::Added);
        assert_eq!(p.add("pear,green"), AddResult::Added);
        let got: Vec<&str> = p.tuples().collect();
        assert_eq!(got, vec!["apple,red", "pear,green"]);
        assert_eq!(p.n_tuples(), 2);
    }

    #[test]
    fn full_when_out_of_space() {
        let mut p = Page::new(24); // capacity = 12 bytes
        assert_eq!(p.add("0123456789"), AddResult::Added); // 11 bytes incl. nul
        assert_eq!(p.add("x"), AddResult::Full);
    }

    #[test]
    fn roundtrip_through_file() {
        let mut f = tmp_file();
        let page_size = 64usize;
        let pid = add_page(&mut f, page_size).unwrap();
        assert_eq!(pid, 0);

        let mut page = read_page(&mut f, pid, page_size).unwrap();
        page.add("hello,world");
        page.set_ovflow(7);
        write_page(&mut f, pid, &page).unwrap();

        f.rewind().unwrap();
        let reread = read_page(&mut f, pid, page_size).unwrap();
        assert_eq!(reread.n_tuples(), 1);
        assert_eq!(reread.ovflow(), 7);
        assert_eq!(reread.tuples().collect::<Vec<_>>(), vec!["hello,world"]);
    }
}
