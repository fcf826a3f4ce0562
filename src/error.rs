use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sequence::{ItemId, SequenceId};

pub type Result<T> = std::result::Result<T, MiningError>;

/// Errors raised while loading a database or validating a run.
///
/// The search itself never fails: once a `SequenceStore` exists, mining runs
/// to completion.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read error: {0}")]
    Read(#[from] io::Error),

    #[error("line {line}: invalid token {token:?}")]
    Parse { line: usize, token: String },

    #[error("line {line}: expected {expected} utilities, found {found}")]
    UtilityCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: no utilities for this sequence")]
    MissingUtilities { line: usize },

    #[error("sequence {sequence}: item {item} occurs twice in one itemset")]
    DuplicateItem { sequence: SequenceId, item: ItemId },

    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}
