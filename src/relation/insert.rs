//! Insertion, overflow handling and the linear-hash split (spec.md §4.5).
//!
//! Split redistribution follows the Open Question resolution in spec.md §9:
//! collect every tuple reachable from the split bucket's primary page and
//! overflow chain into a list, reset that bucket to one fresh empty page,
//! then reinsert each collected tuple using split-time addressing. This
//! replaces the original C's fragile `numVisitedTp >= pageNTuples` exit
//! condition with an approach that is obviously correct.

use crate::consts::NO_PAGE;
use crate::error::{MalhfError, Result};
use crate::page::{self, AddResult, Page};
use crate::tuple::split_attrs;

use super::Relation;

impl Relation {
    /// `addToRelation`: validate, hash, place the tuple, and split if the
    /// load predicate now holds.
    pub fn insert(&mut self, tuple: &str) -> Result<()> {
        if self.mode != super::Mode::Write {
            return Err(MalhfError::corrupt("insert on a read-only relation"));
        }
        // Validate shape first so a malformed tuple never touches any page.
        split_attrs(tuple, self.nattrs)?;

        let capacity = self.page_capacity();
        if tuple.len() + 1 > capacity {
            return Err(MalhfError::TupleTooLarge {
                len: tuple.len(),
                capacity,
            });
        }

        let hash = self.tuple_hash_of(tuple)?;
        let address = self.primary_address(hash);
        self.insert_at(address, tuple, true)?;

        let threshold = self.config.split_threshold(self.nattrs) as u64;
        if self.ntups % threshold == 0 {
            self.perform_split()?;
        }
        self.flush_header()?;
        Ok(())
    }

    /// Place `tuple` at bucket `address`, walking the overflow chain if the
    /// primary page is full. `bump_ntups` is false during split
    /// redistribution, per spec.md §4.5.
    pub(crate) fn insert_at(&mut self, address: u32, tuple: &str, bump_ntups: bool) -> Result<()> {
        let ps = self.config.page_size as usize;
        let mut page = page::read_page(&mut self.data, address, ps)?;

        match page.add(tuple) {
            AddResult::Added => {
                page::write_page(&mut self.data, address, &page)?;
                if bump_ntups {
                    self.ntups += 1;
                }
                Ok(())
            }
            AddResult::Full => self.handle_overflow(address, page, tuple, bump_ntups),
        }
    }

    /// Walk the overflow chain starting at `primary_page`'s `ovflow` link;
    /// append a new overflow page if the chain is exhausted without a fit.
    fn handle_overflow(
        &mut self,
        primary_id: u32,
        primary_page: Page,
        tuple: &str,
        bump_ntups: bool,
    ) -> Result<()> {
        let ps = self.config.page_size as usize;

        let mut prev_is_primary = true;
        let mut prev_id = primary_id;
        let mut prev_page = primary_page;
        let mut cur_id = prev_page.ovflow();

        loop {
            if cur_id == NO_PAGE {
                let new_id = page::add_page(&mut self.ovflow, ps)?;
                let mut new_page = Page::new(ps);
                let added = new_page.add(tuple);
                debug_assert_eq!(added, AddResult::Added, "fresh page must fit any valid tuple");
                page::write_page(&mut self.ovflow, new_id, &new_page)?;

                prev_page.set_ovflow(new_id);
                if prev_is_primary {
                    page::write_page(&mut self.data, prev_id, &prev_page)?;
                } else {
                    page::write_page(&mut self.ovflow, prev_id, &prev_page)?;
                }
                break;
            }

            let mut page = page::read_page(&mut self.ovflow, cur_id, ps)?;
            match page.add(tuple) {
                AddResult::Added => {
                    page::write_page(&mut self.ovflow, cur_id, &page)?;
                    break;
                }
                AddResult::Full => {
                    let next = page.ovflow();
                    prev_is_primary = false;
                    prev_id = cur_id;
                    prev_page = page;
                    cur_id = next;
                }
            }
        }

        if bump_ntups {
            self.ntups += 1;
        }
        Ok(())
    }

    /// One linear-hash split step: grow the file by one page, redistribute
    /// the split bucket, advance `(sp, depth)`.
    pub(crate) fn perform_split(&mut self) -> Result<()> {
        let ps = self.config.page_size as usize;
        let new_bucket = page::add_page(&mut self.data, ps)?;
        debug_assert_eq!(new_bucket, self.npages, "new bucket must be 2^d + sp");
        self.npages += 1;

        let collected = self.collect_bucket_tuples(self.sp)?;

        let fresh = Page::new(ps);
        page::write_page(&mut self.data, self.sp, &fresh)?;

        for t in &collected {
            let hash = self.tuple_hash_of(t)?;
            let address = self.split_time_address(hash);
            self.insert_at(address, t, false)?;
        }

        self.sp += 1;
        if self.sp == (1u32 << self.depth) {
            self.sp = 0;
            self.depth += 1;
        }

        log::debug!(
            "split complete: moved {} tuples, new depth={} sp={} npages={}",
            collected.len(),
            self.depth,
            self.sp,
            self.npages
        );
        Ok(())
    }

    /// Collect every tuple reachable from `bucket`'s primary page and its
    /// overflow chain, in on-disk order. Old overflow pages are left
    /// unreclaimed (spec.md §9: accepted as fragmentation).
    fn collect_bucket_tuples(&mut self, bucket: u32) -> Result<Vec<String>> {
        let ps = self.config.page_size as usize;
        let mut out = Vec::new();

        let primary = page::read_page(&mut self.data, bucket, ps)?;
        out.extend(primary.tuples().map(str::to_string));

        let mut cur = primary.ovflow();
        while cur != NO_PAGE {
            let p = page::read_page(&mut self.ovflow, cur, ps)?;
            out.extend(p.tuples().map(str::to_string));
            cur = p.ovflow();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chvec::round_robin_chvec;
    use crate::config::RelationConfig;
    use crate::relation::Mode;

    fn unique_name(prefix: &str) -> String {
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("malhf-{prefix}-{}-{t}", std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn single_insert_then_exact_query_roundtrip_via_stats() {
        let name = unique_name("insert1");
        let chvec = round_robin_chvec(2);
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default()).unwrap();
        rel.insert("apple,red").unwrap();
        assert_eq!(rel.ntuples(), 1);
        rel.close().unwrap();
    }

    #[test]
    fn malformed_tuple_rejected_without_side_effects() {
        let name = unique_name("malformed");
        let chvec = round_robin_chvec(2);
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default()).unwrap();
        let err = rel.insert("apple");
        assert!(matches!(err, Err(MalhfError::MalformedTuple { .. })));
        assert_eq!(rel.ntuples(), 0);
        rel.close().unwrap();
    }

    #[test]
    fn tuple_too_large_rejected_without_side_effects() {
        let name = unique_name("toolarge");
        let chvec = round_robin_chvec(2);
        let mut cfg = RelationConfig::default();
        cfg.page_size = 32; // tiny page to make oversize easy to trigger
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, cfg).unwrap();
        let huge = format!("{},{}", "x".repeat(100), "y");
        let err = rel.insert(&huge);
        assert!(matches!(err, Err(MalhfError::TupleTooLarge { .. })));
        assert_eq!(rel.ntuples(), 0);
        rel.close().unwrap();
    }

    #[test]
    fn split_triggers_at_threshold_and_preserves_ntups() {
        let name = unique_name("split");
        let chvec = round_robin_chvec(2);
        let mut cfg = RelationConfig::default();
        cfg.split_threshold_numerator = 20; // threshold = floor(20/20) = 1: split every insert
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, cfg).unwrap();

        for i in 0..10 {
            rel.insert(&format!("k{i},v{i}")).unwrap();
        }
        assert_eq!(rel.ntuples(), 10);
        assert!(rel.npages() >= 2);
        rel.close().unwrap();
    }

    #[test]
    fn overflow_chain_keeps_all_tuples_retrievable() {
        let name = unique_name("overflow");
        // Every tuple hashes identically (choice vector all zero -> same bucket for everything
        // with a fixed attribute count), forcing an overflow chain on one bucket.
        let chvec = vec!["0:0"; crate::consts::MAXCHVEC].join(",");
        let mut cfg = RelationConfig::default();
        cfg.page_size = 64;
        cfg.split_threshold_numerator = 1_000_000; // effectively disable splitting
        // depth=0 means every address is getLower(h, 0) == 0: every tuple lands
        // in the single bucket regardless of its hash, guaranteeing an overflow chain.
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, cfg).unwrap();

        for i in 0..50 {
            rel.insert(&format!("k{i},v{i}")).unwrap();
        }
        assert_eq!(rel.ntuples(), 50);

        let bucket0 = page::read_page(&mut rel.data, 0, rel.config.page_size as usize).unwrap();
        assert_ne!(bucket0.ovflow(), NO_PAGE, "expected an overflow chain");
        rel.close().unwrap();
    }
}
