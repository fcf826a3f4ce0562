//! Closed high-utility sequential pattern mining.
//!
//! A database of sequences of itemsets, each item carrying a utility, is
//! searched depth-first for patterns whose minimum per-sequence utility
//! (`umin`) reaches a threshold and which no same-support superpattern
//! contains.

pub mod closure;
pub mod config;
pub mod error;
pub mod extension;
pub mod pattern;
pub mod reader;
pub mod search;
pub mod sequence;
pub mod sidul;

pub use closure::{ClosureRepository, InsertOutcome};
pub use config::MiningConfig;
pub use error::{MiningError, Result};
pub use pattern::{is_contained_by, ItemInstance, Occurrences, Pattern, Token};
pub use reader::{parse_database, read_database};
pub use search::{Mined, Miner};
pub use sequence::{Item, ItemId, Itemset, Sequence, SequenceId, SequenceStore, Utility};

/// Mine `store` with `config` in one call.
pub fn mine(store: SequenceStore, config: MiningConfig) -> Result<Mined> {
    Ok(Miner::new(config)?.mine(store))
}
