use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use bit_set::BitSet;
use tracing::{info, trace};

use crate::closure::ClosureRepository;
use crate::config::MiningConfig;
use crate::error::Result;
use crate::extension::{
    itemset_extend, itemset_extension_bound, sequence_extend, sequence_extension_bound,
};
use crate::pattern::Pattern;
use crate::sequence::{ItemId, SequenceStore, Utility};
use crate::sidul::{self, ItemPatterns};

/// Depth-first branch-and-bound miner for closed high-utility sequential
/// patterns.
///
/// # Example:
/// ```rust
/// use high_utility_pattern::{Miner, MiningConfig, Sequence, SequenceStore};
///
/// let store: SequenceStore = vec![
///     Sequence::from_pairs(vec![vec![(1, 1.0), (2, 2.0)]]),
///     Sequence::from_pairs(vec![vec![(1, 3.0)], vec![(2, 1.0)]]),
/// ]
/// .into_iter()
/// .collect();
///
/// let miner = Miner::new(MiningConfig::new(2.0, 3.0)).unwrap();
/// let mined = miner.mine(store);
///
/// let names: Vec<String> = mined.report().map(|(name, _)| name).collect();
/// assert_eq!(names, vec!["1", "2"]);
/// ```
#[derive(Clone, Debug)]
pub struct Miner {
    config: MiningConfig,
}

impl Miner {
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Reduce the database, then search every single-item subtree.
    pub fn mine(&self, store: SequenceStore) -> Mined {
        info!(
            sequences = store.len(),
            items = store.item_count(),
            min_support = self.config.min_support,
            min_utility = self.config.min_utility,
            "mining started"
        );

        let (store, items) = sidul::prepare(store, self.config.min_support, self.config.min_utility);
        info!(
            sequences = store.len(),
            base_items = items.len(),
            "database reduced"
        );

        let repository = ClosureRepository::new();
        let search = Search::new(&store, &items, &repository, &self.config);
        search.run();

        let visited = search.visited.into_inner();
        let patterns = repository.into_patterns();
        info!(visited, patterns = patterns.len(), "mining finished");

        Mined {
            patterns,
            sequences: store.len(),
            base_items: items.len(),
            visited,
        }
    }
}

/// Closed patterns of one run together with run statistics.
pub struct Mined {
    patterns: Vec<Pattern>,
    sequences: usize,
    base_items: usize,
    visited: usize,
}

impl Mined {
    /// Closed patterns by descending support, then name.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn into_patterns(self) -> Vec<Pattern> {
        self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Sequences left after reduction.
    pub fn sequences(&self) -> usize {
        self.sequences
    }

    /// Items left after reduction.
    pub fn base_items(&self) -> usize {
        self.base_items
    }

    /// Search-tree nodes visited.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Produce an impl Iterator<Item = (String, usize)> of each Pattern and Support
    pub fn report(&self) -> impl Iterator<Item = (String, usize)> + '_ {
        self.patterns
            .iter()
            .map(|pattern| (pattern.to_string(), pattern.support()))
    }
}

impl fmt::Debug for Mined {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "# items: {}, # sequences: {}, # visited: {}",
            self.base_items, self.sequences, self.visited
        )?;
        for pattern in &self.patterns {
            writeln!(
                f,
                "Pattern: {}, Support: {}, Size: {}, umin: {}, Maximal: {}",
                pattern,
                pattern.support(),
                pattern.size(),
                pattern.umin(),
                pattern.is_maximal()
            )?;
        }
        write!(f, "Total: {}", self.patterns.len())
    }
}

struct Search<'a> {
    store: &'a SequenceStore,
    /// Base item patterns by ascending id. Candidate sets hold indices into
    /// this list, so their size follows the number of items, not the ids.
    bases: Vec<&'a Pattern>,
    repository: &'a ClosureRepository,
    min_support: f64,
    min_utility: Utility,
    parallel: bool,
    visited: AtomicUsize,
}

type Task<'s> = (Pattern, &'s BitSet, &'s BitSet);

impl<'a> Search<'a> {
    fn new(
        store: &'a SequenceStore,
        items: &'a ItemPatterns,
        repository: &'a ClosureRepository,
        config: &MiningConfig,
    ) -> Self {
        Self {
            store,
            bases: items.values().collect(),
            repository,
            min_support: config.min_support,
            min_utility: config.min_utility,
            parallel: config.parallel,
            visited: AtomicUsize::new(0),
        }
    }

    /// Every base item index.
    fn universe(&self) -> BitSet {
        (0..self.bases.len()).collect()
    }

    fn run(&self) {
        let all = self.universe();
        let roots = self
            .bases
            .iter()
            .map(|&pattern| (pattern.clone(), &all, &all))
            .collect();
        self.descend(roots);
    }

    /// First index whose item id is greater than `id`.
    fn after(&self, id: ItemId) -> usize {
        match self.bases.binary_search_by_key(&id, |pattern| pattern.last_item()) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    fn visit(&self, mut pattern: Pattern, i_items: &BitSet, s_items: &BitSet) {
        self.visited.fetch_add(1, Ordering::Relaxed);

        if pattern.umin() >= self.min_utility {
            let outcome = self.repository.insert(&pattern);
            if outcome.stop_sequence_extension {
                pattern.do_sequence_extend = false;
            }
            if outcome.prune {
                pattern.do_itemset_extend = false;
                trace!(pattern = %pattern, "pruned by closed superpattern");
                return;
            }
        }

        if pattern.rbu() < self.min_utility {
            trace!(pattern = %pattern, rbu = pattern.rbu(), "below utility bound");
            return;
        }

        let mut next_i = BitSet::new();
        let mut itemset_children = Vec::new();
        let first = self.after(pattern.last_item());
        for index in i_items.iter().filter(|&index| index >= first) {
            let item = self.bases[index];
            if !itemset_extension_bound(&pattern, item).passes(self.min_support, self.min_utility) {
                continue;
            }
            next_i.insert(index);
            if let Some(child) = itemset_extend(&pattern, item, self.store) {
                if child.se() == pattern.se() {
                    pattern.do_sequence_extend = false;
                }
                itemset_children.push(child);
            }
        }

        let mut sequence_children = Vec::new();
        let mut filtered = None;
        if pattern.do_sequence_extend {
            let mut next_s = BitSet::new();
            for index in s_items.iter() {
                let item = self.bases[index];
                if !sequence_extension_bound(&pattern, item).passes(self.min_support, self.min_utility) {
                    continue;
                }
                next_s.insert(index);
                if let Some(child) = sequence_extend(&pattern, item, self.store) {
                    sequence_children.push(child);
                }
            }
            filtered = Some(next_s);
        }
        let next_s = filtered.as_ref().unwrap_or(s_items);

        let mut tasks: Vec<Task<'_>> = Vec::with_capacity(sequence_children.len() + itemset_children.len());
        tasks.extend(sequence_children.into_iter().map(|child| (child, next_s, next_s)));
        tasks.extend(itemset_children.into_iter().map(|child| (child, &next_i, next_s)));
        self.descend(tasks);
    }

    /// Visit every child; returns once all of them, and their subtrees, are
    /// done, so the candidate sets they borrow outlive them.
    fn descend(&self, tasks: Vec<Task<'_>>) {
        if self.parallel {
            rayon::scope(|scope| {
                for (child, i_items, s_items) in tasks {
                    scope.spawn(move |_| self.visit(child, i_items, s_items));
                }
            });
        } else {
            for (child, i_items, s_items) in tasks {
                self.visit(child, i_items, s_items);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::{Miner, Search};
    use crate::closure::ClosureRepository;
    use crate::config::MiningConfig;
    use crate::error::MiningError;
    use crate::sequence::{Sequence, SequenceStore};
    use crate::sidul::build;

    // 0: {1:2} {1:5, 2:1} {2:4}
    // 1: {2:3} {1:1} {2:2}
    fn store() -> SequenceStore {
        vec![
            Sequence::from_pairs(vec![vec![(1, 2.0)], vec![(1, 5.0), (2, 1.0)], vec![(2, 4.0)]]),
            Sequence::from_pairs(vec![vec![(2, 3.0)], vec![(1, 1.0)], vec![(2, 2.0)]]),
        ]
        .into_iter()
        .collect()
    }

    fn summary(config: MiningConfig, store: SequenceStore) -> Vec<(String, usize, f64, bool)> {
        Miner::new(config)
            .unwrap()
            .mine(store)
            .patterns()
            .iter()
            .map(|p| (p.to_string(), p.support(), p.umin(), p.is_maximal()))
            .collect()
    }

    #[test]
    fn test_single_items_stay_closed_when_no_extension_is_frequent() {
        let store: SequenceStore = vec![
            Sequence::from_pairs(vec![vec![(1, 1.0), (2, 2.0)]]),
            Sequence::from_pairs(vec![vec![(1, 3.0)], vec![(2, 1.0)]]),
        ]
        .into_iter()
        .collect();

        let mined = Miner::new(MiningConfig::new(2.0, 3.0)).unwrap().mine(store);

        assert_eq!(mined.len(), 2);
        assert_eq!(mined.base_items(), 2);
        // Two roots, neither has a child with support 2.
        assert_eq!(mined.visited(), 2);
        assert_eq!(
            mined.report().collect::<Vec<_>>(),
            vec![("1".to_string(), 2), ("2".to_string(), 2)]
        );
        assert_eq!(mined.patterns()[0].umin(), 4.0);
    }

    #[test]
    fn test_closed_patterns() {
        let mined = summary(MiningConfig::new(2.0, 0.0), store());

        assert_eq!(
            mined,
            vec![
                ("1 -1 2".to_string(), 2, 6.0, true),
                ("2 -1 2".to_string(), 2, 10.0, true),
            ]
        );
    }

    #[test]
    fn test_utility_threshold_filters_closed_patterns() {
        let mined = summary(MiningConfig::new(2.0, 7.0), store());

        assert_eq!(mined, vec![("2 -1 2".to_string(), 2, 10.0, true)]);
    }

    #[test]
    fn test_low_rbu_stops_before_any_child() {
        let store = store();
        let items = build(&store);
        let root = items[&1].clone();
        assert!(root.rbu() < 20.0);

        let repository = ClosureRepository::new();
        let config = MiningConfig::new(1.0, 20.0);
        let search = Search::new(&store, &items, &repository, &config);
        let all = search.universe();
        search.visit(root, &all, &all);

        assert_eq!(search.visited.load(Ordering::Relaxed), 1);
        assert!(repository.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = summary(MiningConfig::new(2.0, 0.0).with_parallel(false), store());

        for _ in 0..8 {
            assert_eq!(summary(MiningConfig::new(2.0, 0.0), store()), sequential);
        }
    }

    #[test]
    fn test_large_item_ids_use_dense_candidate_sets() {
        let (a, b, c) = (3_000_000_001, 3_000_000_002, 4_000_000_000);
        let store: SequenceStore = vec![
            Sequence::from_pairs(vec![vec![(a, 1.0), (b, 2.0)], vec![(c, 3.0)]]),
            Sequence::from_pairs(vec![vec![(a, 2.0)], vec![(c, 1.0)]]),
            Sequence::from_pairs(vec![vec![(a, 1.0), (b, 1.0)]]),
        ]
        .into_iter()
        .collect();

        let items = build(&store);
        let repository = ClosureRepository::new();
        let config = MiningConfig::new(2.0, 0.0);
        let search = Search::new(&store, &items, &repository, &config);
        let all = search.universe();
        assert_eq!(all.len(), 3);
        assert!(all.capacity() < 1024);
        assert_eq!(search.after(a), 1);
        assert_eq!(search.after(c), 3);

        let mined = Miner::new(config.with_parallel(false)).unwrap().mine(store);
        assert_eq!(
            mined.report().collect::<Vec<_>>(),
            vec![
                ("3000000001".to_string(), 3),
                ("3000000001 3000000002".to_string(), 2),
                ("3000000001 -1 4000000000".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_branch_order_does_not_change_the_closed_set() {
        // 0: {2} {2} {1} {1, 2, 4}
        // 1: {2} {2} {1} {2}
        // 2: {2} {2} {1, 2, 3}
        // "2 -1 2 -1 1 2" (sequences 0, 2) and "2 -1 2 -1 1 -1 2" (0, 1) share
        // support, SE and SLIP but neither covers the other's subtree.
        let store = || -> SequenceStore {
            vec![
                Sequence::from_pairs(vec![
                    vec![(2, 1.0)],
                    vec![(2, 1.0)],
                    vec![(1, 1.0)],
                    vec![(1, 1.0), (2, 1.0), (4, 1.0)],
                ]),
                Sequence::from_pairs(vec![vec![(2, 1.0)], vec![(2, 1.0)], vec![(1, 1.0)], vec![(2, 1.0)]]),
                Sequence::from_pairs(vec![
                    vec![(2, 1.0)],
                    vec![(2, 1.0)],
                    vec![(1, 1.0), (2, 1.0), (3, 1.0)],
                ]),
            ]
            .into_iter()
            .collect()
        };

        let sequential = summary(MiningConfig::new(1.0, 0.0).with_parallel(false), store());
        assert!(sequential
            .iter()
            .any(|(name, support, _, _)| name == "2 -1 2 -1 1 2 3" && *support == 1));

        for _ in 0..8 {
            assert_eq!(summary(MiningConfig::new(1.0, 0.0), store()), sequential);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        match Miner::new(MiningConfig::new(2.0, -1.0)) {
            Err(MiningError::InvalidThreshold { name, value }) => {
                assert_eq!(name, "min_utility");
                assert_eq!(value, -1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
