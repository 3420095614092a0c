//! Error type for the MALHF core.
//!
//! The teacher crate threads `anyhow::Error` through everything; here callers
//! need to branch on *kind* (a `TUPLE_TOO_LARGE` is recoverable and leaves
//! `ntups` untouched, a `BAD_CHVEC` fails construction outright), so the
//! public surface is a dedicated enum in the style `rdaum-moor` uses for its
//! error types, rather than a stringly-typed `anyhow::Error`.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum MalhfError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("bad choice vector: {0}")]
    BadChoiceVector(String),

    #[error("tuple of {len} bytes cannot fit in a fresh page (capacity {capacity} bytes)")]
    TupleTooLarge { len: usize, capacity: usize },

    #[error("relation '{0}' already exists")]
    RelationExists(String),

    #[error("no such relation '{0}'")]
    NoSuchRelation(String),

    #[error("malformed tuple: expected {expected} attributes, got {got}")]
    MalformedTuple { expected: usize, got: usize },

    /// Internal consistency violation (page-count mismatch, corrupt header,
    /// cyclic overflow chain, ...). Surfaced as an error rather than a panic,
    /// but never expected to be handled by a caller beyond logging/abort.
    #[error("internal consistency error: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, MalhfError>;

impl MalhfError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        MalhfError::Corrupt(msg.into())
    }
}
