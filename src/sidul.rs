use std::collections::BTreeMap;

use bit_set::BitSet;
use rayon::prelude::*;
use tracing::debug;

use crate::pattern::{ItemInstance, Occurrences, Pattern};
use crate::sequence::{ItemId, Itemset, Sequence, SequenceStore, Utility};

/// Single-item patterns keyed by item id.
pub type ItemPatterns = BTreeMap<ItemId, Pattern>;

/// Scan the database once and build the occurrence list of every item.
pub fn build(store: &SequenceStore) -> ItemPatterns {
    let mut lists: BTreeMap<ItemId, Occurrences> = BTreeMap::new();

    for (&sid, sequence) in store {
        let mut prefix: Utility = 0.0;
        for (position, itemset) in sequence.itemsets().iter().enumerate() {
            for item in itemset {
                prefix += item.utility;
                lists
                    .entry(item.id)
                    .or_default()
                    .entry(sid)
                    .or_default()
                    .push(ItemInstance::new(
                        item.utility,
                        sequence.utility() - prefix,
                        position,
                    ));
            }
        }
    }

    lists
        .into_par_iter()
        .map(|(id, occurrences)| (id, Pattern::single(id, occurrences, store)))
        .collect()
}

/// Sum of the total utility of every sequence the pattern occurs in.
pub fn local_range_utility(pattern: &Pattern, store: &SequenceStore) -> Utility {
    pattern
        .occurrences()
        .keys()
        .filter_map(|&sid| store.get(sid))
        .map(Sequence::utility)
        .sum()
}

/// One filtering pass: drop every item whose support or local range utility
/// is below threshold, then drop itemsets and sequences left empty.
///
/// A single pass is not idempotent on its own: dropping items lowers the
/// sequence totals, which can push other items under the threshold. Use
/// `prepare` for a stable result.
pub fn reduce(
    store: &SequenceStore,
    items: &ItemPatterns,
    min_support: f64,
    min_utility: Utility,
) -> SequenceStore {
    let ids: Vec<ItemId> = items.keys().copied().collect();
    let kept: BitSet = items
        .values()
        .enumerate()
        .filter(|(_, pattern)| {
            pattern.support() as f64 >= min_support
                && local_range_utility(pattern, store) >= min_utility
        })
        .map(|(index, _)| index)
        .collect();
    let is_kept = |id: ItemId| match ids.binary_search(&id) {
        Ok(index) => kept.contains(index),
        Err(_) => false,
    };

    store
        .iter()
        .map(|(&sid, sequence)| {
            let sequence: Sequence = sequence
                .itemsets()
                .iter()
                .map(|itemset| {
                    itemset
                        .iter()
                        .filter(|item| is_kept(item.id))
                        .cloned()
                        .collect::<Itemset>()
                })
                .collect();
            (sid, sequence)
        })
        .collect()
}

/// Reduce until a pass drops nothing, returning the reduced database and
/// the item patterns rebuilt on it.
///
/// Each pass recomputes local range utilities from the already reduced
/// totals, so a second pass can still drop items the first one kept.
pub fn prepare(
    store: SequenceStore,
    min_support: f64,
    min_utility: Utility,
) -> (SequenceStore, ItemPatterns) {
    let mut store = store;
    let mut items = build(&store);
    let mut pass = 0;

    loop {
        pass += 1;
        let reduced = reduce(&store, &items, min_support, min_utility);
        let dropped = store.item_count() - reduced.item_count();
        debug!(
            pass,
            dropped,
            sequences = reduced.len(),
            items = reduced.item_count(),
            "database reduction pass"
        );
        if dropped == 0 {
            return (store, items);
        }
        store = reduced;
        items = build(&store);
    }
}
