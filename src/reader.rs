use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::info;

use crate::error::{MiningError, Result};
use crate::sequence::{Item, ItemId, Itemset, Sequence, SequenceId, SequenceStore, Utility};

pub const SEQUENCES_FILE: &str = "sequences.csv";
pub const UTILITIES_FILE: &str = "utilities.csv";

const END_ITEMSET: i64 = -1;
const END_SEQUENCE: i64 = -2;

/// Load `dir/sequences.csv` and `dir/utilities.csv`.
pub fn read_database<P: AsRef<Path>>(dir: P) -> Result<SequenceStore> {
    let dir = dir.as_ref();
    let store = parse_database(
        open(dir.join(SEQUENCES_FILE))?,
        open(dir.join(UTILITIES_FILE))?,
    )?;
    info!(
        path = %dir.display(),
        sequences = store.len(),
        items = store.item_count(),
        "database loaded"
    );
    Ok(store)
}

fn open(path: PathBuf) -> Result<BufReader<File>> {
    match File::open(&path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(source) => Err(MiningError::Io { path, source }),
    }
}

/// Parse a database from its two line-aligned streams.
///
/// Each sequences line holds tab-separated item ids, with `-1` closing an
/// itemset and `-2` closing the sequence. The utilities line at the same
/// index holds one value per token; values under boundary tokens are
/// ignored. Blank lines are skipped and do not consume a sequence id.
pub fn parse_database<S: BufRead, U: BufRead>(sequences: S, utilities: U) -> Result<SequenceStore> {
    let mut utilities = utilities.lines();
    let mut store = SequenceStore::new();
    let mut next_id: SequenceId = 0;

    for (index, line) in sequences.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let values = match utilities.next() {
            Some(values) => values?,
            None if line.trim().is_empty() => String::new(),
            None => return Err(MiningError::MissingUtilities { line: line_no }),
        };
        if line.trim().is_empty() {
            continue;
        }

        let tokens: Vec<i64> = parse_all(&line, line_no)?;
        let values: Vec<Utility> = parse_all(&values, line_no)?;
        if tokens.len() != values.len() {
            return Err(MiningError::UtilityCountMismatch {
                line: line_no,
                expected: tokens.len(),
                found: values.len(),
            });
        }

        let sequence = parse_sequence(&tokens, &values, next_id, line_no)?;
        if !sequence.is_empty() {
            store.insert(next_id, sequence);
            next_id += 1;
        }
    }

    Ok(store)
}

fn parse_all<T: FromStr>(line: &str, line_no: usize) -> Result<Vec<T>> {
    line.split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| MiningError::Parse {
                line: line_no,
                token: token.to_string(),
            })
        })
        .collect()
}

fn parse_sequence(
    tokens: &[i64],
    values: &[Utility],
    id: SequenceId,
    line_no: usize,
) -> Result<Sequence> {
    let mut itemsets: Vec<Itemset> = Vec::new();
    let mut current: Itemset = Vec::new();

    for (&token, &utility) in tokens.iter().zip(values) {
        match token {
            END_ITEMSET | END_SEQUENCE => {
                if !current.is_empty() {
                    itemsets.push(mem::take(&mut current));
                }
                if token == END_SEQUENCE {
                    break;
                }
            }
            _ => {
                let item = ItemId::try_from(token).map_err(|_| MiningError::Parse {
                    line: line_no,
                    token: token.to_string(),
                })?;
                if current.iter().any(|existing| existing.id == item) {
                    return Err(MiningError::DuplicateItem { sequence: id, item });
                }
                current.push(Item::new(item, utility));
            }
        }
    }
    if !current.is_empty() {
        itemsets.push(current);
    }

    Ok(Sequence::new(itemsets))
}
