use std::path::PathBuf;
use std::process;

use clap::Parser;
use high_utility_pattern::{read_database, Miner, MiningConfig, Sequence, SequenceStore};
use tracing_subscriber::EnvFilter;

// <{1:2}, {1:5, 2:1}, {2:4}>, <{2:3}, {1:1}, {2:2}>, <{1:4, 3:1}, {2:6}>
fn sample() -> SequenceStore {
    vec![
        Sequence::from_pairs(vec![vec![(1, 2.0)], vec![(1, 5.0), (2, 1.0)], vec![(2, 4.0)]]),
        Sequence::from_pairs(vec![vec![(2, 3.0)], vec![(1, 1.0)], vec![(2, 2.0)]]),
        Sequence::from_pairs(vec![vec![(1, 4.0), (3, 1.0)], vec![(2, 6.0)]]),
    ]
    .into_iter()
    .collect()
}

#[derive(Debug, Parser)]
#[command(name = "mine")]
#[command(about = "Mine closed high-utility sequential patterns", long_about = None)]
struct Args {
    /// Minimum number of sequences a pattern must occur in
    #[arg(value_name = "MIN_SUPP", default_value_t = 2.0)]
    min_support: f64,

    /// Minimum utility for a pattern to be reported
    #[arg(value_name = "MIN_UTILITY", default_value_t = 6.0)]
    min_utility: f64,

    /// Directory holding sequences.csv and utilities.csv; a small built-in
    /// database is mined without it
    #[arg(value_name = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Recurse in place instead of spawning rayon tasks
    #[arg(long)]
    sequential: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = MiningConfig::new(args.min_support, args.min_utility).with_parallel(!args.sequential);

    let store = match &args.data_dir {
        Some(dir) => read_database(dir).unwrap_or_else(|err| {
            eprintln!("{}", err);
            process::exit(1);
        }),
        None => sample(),
    };

    let miner = Miner::new(config).unwrap_or_else(|err| {
        eprintln!("{}", err);
        process::exit(2);
    });
    let mined = miner.mine(store);
    println!("{:?}", mined);

    for (pattern, support) in mined.report() {
        println!("Pattern: {}, Support: {}", pattern, support);
    }
}
