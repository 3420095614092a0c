//! Relation statistics, grounded on the original's `relationStats` dump —
//! here split into a data-returning `stats()` (so library callers don't have
//! to scrape stdout) and a `print_stats()` convenience that formats it the
//! same way the original CLI did.

use crate::consts::NO_PAGE;
use crate::error::Result;
use crate::page;

use super::Relation;

#[derive(Debug, Clone)]
pub struct BucketInfo {
    pub page_id: u32,
    pub in_overflow: bool,
    pub ntuples: u32,
    pub free_space: u32,
    pub ovflow: u32,
}

#[derive(Debug, Clone)]
pub struct RelationStats {
    pub nattrs: u32,
    pub depth: u32,
    pub sp: u32,
    pub npages: u32,
    pub ntups: u64,
    pub chvec: String,
    /// One entry per primary page, itself followed by its overflow chain.
    pub buckets: Vec<Vec<BucketInfo>>,
}

impl Relation {
    /// `relationStats`: collect global info, choice vector and per-bucket
    /// page chains without printing anything.
    pub fn stats(&mut self) -> Result<RelationStats> {
        let ps = self.config.page_size as usize;
        let mut buckets = Vec::with_capacity(self.npages as usize);

        for pid in 0..self.npages {
            let mut chain = Vec::new();
            let primary = page::read_page(&mut self.data, pid, ps)?;
            let mut ovid = primary.ovflow();
            chain.push(BucketInfo {
                page_id: pid,
                in_overflow: false,
                ntuples: primary.n_tuples(),
                free_space: primary.free_space(),
                ovflow: ovid,
            });
            while ovid != NO_PAGE {
                let cur = ovid;
                let p = page::read_page(&mut self.ovflow, cur, ps)?;
                ovid = p.ovflow();
                chain.push(BucketInfo {
                    page_id: cur,
                    in_overflow: true,
                    ntuples: p.n_tuples(),
                    free_space: p.free_space(),
                    ovflow: ovid,
                });
            }
            buckets.push(chain);
        }

        Ok(RelationStats {
            nattrs: self.nattrs,
            depth: self.depth,
            sp: self.sp,
            npages: self.npages,
            ntups: self.ntups,
            chvec: crate::chvec::format_chvec(&self.chvec),
            buckets,
        })
    }
}

impl std::fmt::Display for RelationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Global Info:")?;
        writeln!(
            f,
            "#attrs:{}  #pages:{}  #tuples:{}  d:{}  sp:{}",
            self.nattrs, self.npages, self.ntups, self.depth, self.sp
        )?;
        writeln!(f, "Choice vector")?;
        writeln!(f, "{}", self.chvec)?;
        writeln!(f, "Bucket Info:")?;
        writeln!(f, "{:<4} {}", "#", "Info on pages in bucket")?;
        writeln!(f, "{:<4} {}", "", "(pageID,#tuples,freebytes,ovflow)")?;
        for (bucket, chain) in self.buckets.iter().enumerate() {
            write!(f, "[{bucket:>2}]  ")?;
            for (i, b) in chain.iter().enumerate() {
                let tag = if b.in_overflow { "ov" } else { "d" };
                let sep = if i == 0 { "" } else { " -> " };
                write!(
                    f,
                    "{sep}({tag}{},{},{},{})",
                    b.page_id, b.ntuples, b.free_space, b.ovflow
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
