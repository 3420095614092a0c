//! Tuple/query literal parsing and matching (§6 collaborator contract).
//!
//! A tuple is `nattrs` comma-separated attribute values; a query pattern has
//! the same shape but any attribute may be the literal `?` wildcard.
//! Attribute values may not contain commas, nulls, or be empty (an empty
//! component is indistinguishable from a missing attribute under
//! comma-splitting, so it is rejected as malformed rather than silently
//! accepted).

use crate::error::{MalhfError, Result};

pub const WILDCARD: &str = "?";

/// Split `s` on commas into exactly `nattrs` components, rejecting embedded
/// nulls and the wrong attribute count.
pub fn split_attrs<'a>(s: &'a str, nattrs: u32) -> Result<Vec<&'a str>> {
    if s.contains('\0') {
        return Err(MalhfError::MalformedTuple {
            expected: nattrs as usize,
            got: 0,
        });
    }
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != nattrs as usize || parts.iter().any(|p| p.is_empty()) {
        return Err(MalhfError::MalformedTuple {
            expected: nattrs as usize,
            got: parts.len(),
        });
    }
    Ok(parts)
}

/// Split a query pattern the same way `split_attrs` does, but empty/`?`
/// components are valid wildcards.
pub fn split_pattern(s: &str, nattrs: u32) -> Result<Vec<&str>> {
    if s.contains('\0') {
        return Err(MalhfError::MalformedTuple {
            expected: nattrs as usize,
            got: 0,
        });
    }
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != nattrs as usize {
        return Err(MalhfError::MalformedTuple {
            expected: nattrs as usize,
            got: parts.len(),
        });
    }
    Ok(parts)
}

#[inline]
pub fn is_wildcard(component: &str) -> bool {
    component == WILDCARD
}

/// `tupleMatch`: true iff the tuple has `nattrs` components and, for each
/// component, either the pattern is a wildcard or the two are byte-equal.
pub fn tuple_match(pattern: &[&str], tuple: &[&str]) -> bool {
    if pattern.len() != tuple.len() {
        return false;
    }
    pattern
        .iter()
        .zip(tuple.iter())
        .all(|(p, t)| is_wildcard(p) || p == t)
}
