use crate::pattern::{ItemInstance, Occurrences, Pattern, Token};
use crate::sequence::{SequenceStore, Utility};

/// Cheap estimate of an extension, computed before any occurrence list is
/// merged.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ExtensionBound {
    /// Sequences in which the extension can occur.
    pub support: usize,
    /// Sum of the prefix's first `utility + rem` over those sequences.
    pub lru: Utility,
}

impl ExtensionBound {
    pub fn passes(&self, min_support: f64, min_utility: Utility) -> bool {
        self.support as f64 >= min_support && self.lru >= min_utility
    }

    fn count(&mut self, first: &ItemInstance) {
        self.support += 1;
        self.lru += first.utility + first.rem;
    }
}

/// Bound for appending `item` to the last itemset of `pattern`: sequences
/// where both share at least one position.
pub fn itemset_extension_bound(pattern: &Pattern, item: &Pattern) -> ExtensionBound {
    let mut bound = ExtensionBound::default();
    for (sid, prefix) in pattern.occurrences() {
        if let Some(suffix) = item.occurrences().get(sid) {
            if shares_position(prefix, suffix) {
                bound.count(&prefix[0]);
            }
        }
    }
    bound
}

/// Bound for appending `item` as a new itemset: sequences where the item
/// occurs after the pattern's first occurrence.
pub fn sequence_extension_bound(pattern: &Pattern, item: &Pattern) -> ExtensionBound {
    let mut bound = ExtensionBound::default();
    for (sid, prefix) in pattern.occurrences() {
        let last = item.occurrences().get(sid).and_then(|suffix| suffix.last());
        if let Some(last) = last {
            if last.position > prefix[0].position {
                bound.count(&prefix[0]);
            }
        }
    }
    bound
}

/// Append `item` to the last itemset of `pattern`.
///
/// Returns `None` when the two never occur in the same itemset.
pub fn itemset_extend(pattern: &Pattern, item: &Pattern, store: &SequenceStore) -> Option<Pattern> {
    let occurrences = merge(pattern, item, join_itemset);
    if occurrences.is_empty() {
        return None;
    }

    let mut name = pattern.name().to_vec();
    name.push(Token::Item(item.last_item()));

    let mut child = Pattern::new(name, item.last_item(), pattern.size(), occurrences, store);
    child.is_sequence_extension = false;
    child.is_parent_sequence_extension = pattern.is_sequence_extension();
    child.parent_last_item = Some(pattern.last_item());
    Some(child)
}

/// Append `item` as a new itemset after `pattern`.
///
/// Returns `None` when the item never occurs after the pattern.
pub fn sequence_extend(pattern: &Pattern, item: &Pattern, store: &SequenceStore) -> Option<Pattern> {
    let occurrences = merge(pattern, item, join_sequence);
    if occurrences.is_empty() {
        return None;
    }

    let mut name = pattern.name().to_vec();
    name.push(Token::Separator);
    name.push(Token::Item(item.last_item()));

    let mut child = Pattern::new(name, item.last_item(), pattern.size() + 1, occurrences, store);
    child.is_sequence_extension = true;
    child.is_parent_sequence_extension = pattern.is_sequence_extension();
    child.parent_last_item = Some(pattern.last_item());
    Some(child)
}

fn merge<F>(pattern: &Pattern, item: &Pattern, join: F) -> Occurrences
where
    F: Fn(&[ItemInstance], &[ItemInstance]) -> Vec<ItemInstance>,
{
    let mut occurrences = Occurrences::new();
    for (&sid, prefix) in pattern.occurrences() {
        if let Some(suffix) = item.occurrences().get(&sid) {
            let joined = join(prefix, suffix);
            if !joined.is_empty() {
                occurrences.insert(sid, joined);
            }
        }
    }
    occurrences
}

fn shares_position(a: &[ItemInstance], b: &[ItemInstance]) -> bool {
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        if a[i].position < b[j].position {
            i += 1;
        } else if a[i].position > b[j].position {
            j += 1;
        } else {
            return true;
        }
    }

    false
}

// Join P & A at the same position, produce P+A
fn join_itemset(prefix: &[ItemInstance], item: &[ItemInstance]) -> Vec<ItemInstance> {
    let mut result = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < prefix.len() && j < item.len() {
        if prefix[i].position < item[j].position {
            i += 1;
            continue;
        };

        if prefix[i].position > item[j].position {
            j += 1;
            continue;
        };

        result.push(ItemInstance::new(
            prefix[i].utility + item[j].utility,
            item[j].rem,
            item[j].position,
        ));
        i += 1;
        j += 1;
    }

    result
}

// Join P & A where A comes later, produce P -> A
//
// Each item occurrence pairs with the cheapest earlier prefix occurrence.
fn join_sequence(prefix: &[ItemInstance], item: &[ItemInstance]) -> Vec<ItemInstance> {
    let mut result = Vec::new();
    let mut cheapest: Option<Utility> = None;
    let mut i = 0;

    for instance in item {
        while i < prefix.len() && prefix[i].position < instance.position {
            let utility = prefix[i].utility;
            cheapest = Some(cheapest.map_or(utility, |c| c.min(utility)));
            i += 1;
        }

        if let Some(cheapest) = cheapest {
            result.push(ItemInstance::new(
                cheapest + instance.utility,
                instance.rem,
                instance.position,
            ));
        }
    }

    result
}
