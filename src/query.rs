//! Query layer: partial-match enumeration (spec.md §4.6).
//!
//! Modeled as the explicit state machine spec.md §9's Design Notes call for
//! — `(combination, bucket, in_overflow, page_id, tuples_visited,
//! byte_offset)` plus a single `advance`-style `next_tuple` — replacing the
//! original C's three interleaved loops.
//!
//! One behavioral fix relative to the original (documented in DESIGN.md and
//! SPEC_FULL.md's REDESIGN FLAGS): when a candidate bucket `B_c >= npages`,
//! this implementation moves on to the next combination instead of
//! terminating the whole scan, matching §4.6's "skip if B_c >= npages".

use std::fs::{File, OpenOptions};

use crate::bits::{bit_is_set, get_lower, set_bit, Bits};
use crate::consts::NO_PAGE;
use crate::error::Result;
use crate::hash::{composite_hash, hash_any};
use crate::page::{self, Page};
use crate::relation::Relation;
use crate::tuple::{is_wildcard, split_pattern, tuple_match};

/// A lazy, finite, non-restartable scan over the tuples matching `pattern`.
/// Borrows the relation's immutable configuration but opens its own
/// read-only file handles, so closing a query never affects the relation
/// and the relation's own handles are never shared with a live scan.
pub struct Query<'a> {
    pattern: Vec<String>,
    unknown: Bits,
    depth_prime: u32,
    start_bucket: u32,
    npages: u32,
    total_combinations: u64,

    data: File,
    ovflow: File,

    cursor: Cursor,

    _rel: &'a Relation,
}

struct Cursor {
    combination: u64,
    in_overflow: bool,
    page_id: u32,
    byte_offset: usize,
    tuples_visited: u32,
    current_page: Option<Page>,
    done: bool,
}

impl<'a> Query<'a> {
    /// `startQuery`: decompose the pattern into `known`/`unknown` bit
    /// vectors and locate the first candidate bucket.
    pub fn start(rel: &'a Relation, pattern: &str) -> Result<Query<'a>> {
        let components = split_pattern(pattern, rel.nattrs())?;

        let chvec = rel.chvec();
        let hash_kind = rel.hash_kind();
        let attr_hashes: Vec<Option<Bits>> = components
            .iter()
            .map(|c| {
                if is_wildcard(c) {
                    None
                } else {
                    Some(hash_any(hash_kind, c.as_bytes()))
                }
            })
            .collect();

        // Build known/unknown in one pass over composite-bit positions, per §4.6 step 3:
        // composite_hash gives us the bit that *would* apply if every attribute were
        // known; positions fed by an unknown attribute are then masked out of `known`
        // and recorded in `unknown` instead.
        let mut known: Bits = composite_hash(chvec, |attr| attr_hashes[attr].unwrap_or(0));
        let mut unknown: Bits = 0;
        for (j, item) in chvec.iter().enumerate() {
            if attr_hashes[item.attr as usize].is_none() {
                unknown = set_bit(unknown, j as u32);
                known &= !(1 << j);
            }
        }

        let depth = rel.depth();
        let sp = rel.splitp();
        let mask = get_lower(u32::MAX, depth);
        let mut start_bucket = known & mask;
        let mut depth_prime = depth;
        if start_bucket < sp {
            depth_prime = depth + 1;
            start_bucket = known & get_lower(u32::MAX, depth_prime);
        }

        let num_unknown = (0..depth_prime).filter(|&p| bit_is_set(unknown, p)).count() as u32;
        let total_combinations: u64 = 1u64 << num_unknown;

        let data = OpenOptions::new().read(true).open(rel.data_path())?;
        let ovflow = OpenOptions::new().read(true).open(rel.ovflow_path())?;

        let mut q = Query {
            pattern: components.into_iter().map(str::to_string).collect(),
            unknown,
            depth_prime,
            start_bucket,
            npages: rel.npages(),
            total_combinations,
            data,
            ovflow,
            cursor: Cursor {
                combination: 0,
                in_overflow: false,
                page_id: 0,
                byte_offset: 0,
                tuples_visited: 0,
                current_page: None,
                done: false,
            },
            _rel: rel,
        };
        q.seek_next_bucket();
        Ok(q)
    }

    /// `nextTuple`: return the next matching tuple, or `None` at
    /// end-of-stream.
    pub fn next_tuple(&mut self, page_size: usize) -> Result<Option<String>> {
        loop {
            if self.cursor.done {
                return Ok(None);
            }

            if self.cursor.current_page.is_none() {
                let page = if self.cursor.in_overflow {
                    page::read_page(&mut self.ovflow, self.cursor.page_id, page_size)?
                } else {
                    page::read_page(&mut self.data, self.cursor.page_id, page_size)?
                };
                self.cursor.current_page = Some(page);
            }

            let ntuples = self.cursor.current_page.as_ref().unwrap().n_tuples();
            if self.cursor.tuples_visited < ntuples {
                let (tuple, new_offset) = {
                    let page = self.cursor.current_page.as_ref().unwrap();
                    read_tuple_at(page.data(), self.cursor.byte_offset)
                };
                self.cursor.byte_offset = new_offset;
                self.cursor.tuples_visited += 1;

                let components: Vec<&str> = tuple.split(',').collect();
                let pattern_refs: Vec<&str> = self.pattern.iter().map(String::as_str).collect();
                if tuple_match(&pattern_refs, &components) {
                    return Ok(Some(tuple));
                }
                continue;
            }

            // Page exhausted: follow the overflow chain, else advance bucket.
            let ovflow = self.cursor.current_page.as_ref().unwrap().ovflow();
            if ovflow != NO_PAGE {
                self.cursor.in_overflow = true;
                self.cursor.page_id = ovflow;
                self.cursor.byte_offset = 0;
                self.cursor.tuples_visited = 0;
                self.cursor.current_page = None;
                continue;
            }

            self.cursor.combination += 1;
            if !self.seek_next_bucket() {
                return Ok(None);
            }
        }
    }

    /// Advance `cursor.combination` forward (starting from its current
    /// value) until it names a bucket `< npages`, or exhaust the
    /// combination space. Returns `false` (and marks the cursor done) when
    /// no further bucket exists.
    fn seek_next_bucket(&mut self) -> bool {
        loop {
            if self.cursor.combination >= self.total_combinations {
                self.cursor.done = true;
                return false;
            }
            let mask = combination_mask(self.unknown, self.depth_prime, self.cursor.combination);
            let candidate = self.start_bucket | mask;
            if candidate < self.npages {
                self.cursor.page_id = candidate;
                self.cursor.in_overflow = false;
                self.cursor.byte_offset = 0;
                self.cursor.tuples_visited = 0;
                self.cursor.current_page = None;
                return true;
            }
            self.cursor.combination += 1;
        }
    }

    /// Number of buckets this scan can visit (`2^U`), for tests of §8
    /// property 8.
    pub fn bucket_budget(&self) -> u64 {
        self.total_combinations
    }

    /// Release the query. Holds no relation-mutating state, so this is a
    /// no-op beyond dropping the borrowed read handles.
    pub fn close(self) {}
}

/// `mask(c)`: walk the unknown bit positions within `[0, depth_prime)` in
/// ascending order; set position `p` in the result iff the corresponding
/// low bit of `combination` is set.
fn combination_mask(unknown: Bits, depth_prime: u32, combination: u64) -> Bits {
    let mut mask: Bits = 0;
    let mut bit_i: u32 = 0;
    for p in 0..depth_prime {
        if bit_is_set(unknown, p) {
            if (combination >> bit_i) & 1 == 1 {
                mask = set_bit(mask, p);
            }
            bit_i += 1;
        }
    }
    mask
}

/// Read one null-terminated tuple string starting at `offset` in `body`,
/// returning it and the offset just past its terminator.
fn read_tuple_at(body: &[u8], offset: usize) -> (String, usize) {
    let rest = &body[offset..];
    let nul = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
    (s, offset + nul + 1)
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

    fn collect_all(rel: &Relation, pattern: &str) -> Vec<String> {
        let mut q = Query::start(rel, pattern).unwrap();
        let mut out = Vec::new();
        while let Some(t) = q.next_tuple(rel.page_size() as usize).unwrap() {
            out.push(t);
        }
        out
    }

    #[test]
    fn exact_match_yields_single_tuple() {
        let name = unique_name("qexact");
        let chvec = round_robin_chvec(2);
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default()).unwrap();
        rel.insert("apple,red").unwrap();

        let got = collect_all(&rel, "apple,red");
        assert_eq!(got, vec!["apple,red".to_string()]);

        let miss = collect_all(&rel, "apple,blue");
        assert!(miss.is_empty());

        rel.close().unwrap();
    }

    #[test]
    fn wildcard_queries_match_expected_sets() {
        let name = unique_name("qwild");
        let chvec = round_robin_chvec(2);
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default()).unwrap();
        rel.insert("apple,red").unwrap();
        rel.insert("apple,blue").unwrap();
        rel.insert("pear,red").unwrap();

        let mut by_apple = collect_all(&rel, "apple,?");
        by_apple.sort();
        assert_eq!(by_apple, vec!["apple,blue".to_string(), "apple,red".to_string()]);

        let mut by_red = collect_all(&rel, "?,red");
        by_red.sort();
        assert_eq!(by_red, vec!["apple,red".to_string(), "pear,red".to_string()]);

        let mut all = collect_all(&rel, "?,?");
        all.sort();
        assert_eq!(
            all,
            vec![
                "apple,blue".to_string(),
                "apple,red".to_string(),
                "pear,red".to_string(),
            ]
        );

        rel.close().unwrap();
    }

    #[test]
    fn fully_wildcard_query_visits_all_pages() {
        let name = unique_name("qbudget");
        let chvec = round_robin_chvec(2);
        let mut cfg = RelationConfig::default();
        cfg.split_threshold_numerator = 20; // split on every insert
        let mut rel = Relation::create(&name, 2, 1, 0, &chvec, cfg).unwrap();
        for i in 0..8 {
            rel.insert(&format!("k{i},v{i}")).unwrap();
        }
        let npages = rel.npages();

        let q = Query::start(&rel, "?,?").unwrap();
        assert_eq!(q.bucket_budget(), npages.next_power_of_two() as u64);
        q.close();
        rel.close().unwrap();
    }

    #[test]
    fn reopening_after_insert_is_visible_to_new_query() {
        let name = unique_name("qreopen");
        let chvec = round_robin_chvec(2);
        {
            let mut rel =
                Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default()).unwrap();
            rel.insert("apple,red").unwrap();
            rel.close().unwrap();
        }
        let rel = Relation::open(&name, Mode::Read, RelationConfig::default()).unwrap();
        let got = collect_all(&rel, "apple,red");
        assert_eq!(got, vec!["apple,red".to_string()]);
        rel.close().unwrap();
    }
}
