//! Choice-vector parsing: converts a string of the form `attr:bit,attr:bit,...`
//! into a `MAXCHVEC`-length sequence of `(attribute index, source-bit index)`
//! pairs.
//!
//! A thin collaborator contract rather than core engine complexity; kept
//! mechanical and small on purpose.

use crate::bits::Bits;
use crate::consts::{MAXBITS, MAXCHVEC};
use crate::error::{MalhfError, Result};

/// One entry of the choice vector: composite-hash bit `j` is drawn from bit
/// `bit` of the hash of attribute `attr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChVecItem {
    pub attr: u32,
    pub bit: u32,
}

/// Parse a choice-vector string into exactly [`MAXCHVEC`] items, validating
/// that every attribute index is in `[0, nattrs)`.
pub fn parse_chvec(spec: &str, nattrs: u32) -> Result<Vec<ChVecItem>> {
    let mut items = Vec::with_capacity(MAXCHVEC);
    for (j, entry) in spec.split(',').enumerate() {
        let entry = entry.trim();
        let (attr_str, bit_str) = entry.split_once(':').ok_or_else(|| {
            MalhfError::BadChoiceVector(format!("entry {j} ('{entry}') is not 'attr:bit'"))
        })?;
        let attr: u32 = attr_str
            .trim()
            .parse()
            .map_err(|_| MalhfError::BadChoiceVector(format!("entry {j}: bad attr '{attr_str}'")))?;
        let bit: Bits = bit_str
            .trim()
            .parse()
            .map_err(|_| MalhfError::BadChoiceVector(format!("entry {j}: bad bit '{bit_str}'")))?;
        if attr >= nattrs {
            return Err(MalhfError::BadChoiceVector(format!(
                "entry {j}: attr {attr} out of range [0, {nattrs})"
            )));
        }
        if bit >= MAXBITS {
            return Err(MalhfError::BadChoiceVector(format!(
                "entry {j}: bit {bit} out of range [0, {MAXBITS})"
            )));
        }
        items.push(ChVecItem { attr, bit });
    }
    if items.len() != MAXCHVEC {
        return Err(MalhfError::BadChoiceVector(format!(
            "expected {MAXCHVEC} entries, got {}",
            items.len()
        )));
    }
    Ok(items)
}

/// Format a choice vector back into its `attr:bit,attr:bit,...` string form.
pub fn format_chvec(chvec: &[ChVecItem]) -> String {
    chvec
        .iter()
        .map(|i| format!("{}:{}", i.attr, i.bit))
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the canonical "alternate bit 0 of each attribute, then bit 1, ..."
/// choice vector used throughout the spec's concrete scenarios
/// (`a0,b0,a1,b1,...` for 2 attributes). Convenience for tests and the CLI's
/// `create` default.
pub fn round_robin_chvec(nattrs: u32) -> String {
    assert!(nattrs > 0, "nattrs must be > 0");
    (0..MAXCHVEC as u32)
        .map(|j| format!("{}:{}", j % nattrs, j / nattrs))
        .collect::<Vec<_>>()
        .join(",")
}
