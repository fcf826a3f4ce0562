use std::collections::btree_map;
use std::collections::BTreeMap;
use std::iter::FromIterator;

pub type ItemId = u32;
pub type SequenceId = u32;
pub type Utility = f64;

/// One occurrence of an item inside an itemset, with its local utility.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub utility: Utility,
}

impl Item {
    pub fn new(id: ItemId, utility: Utility) -> Self {
        Self { id, utility }
    }
}

pub type Itemset = Vec<Item>;

/// An ordered list of non-empty itemsets together with its total utility.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    itemsets: Vec<Itemset>,
    utility: Utility,
}

impl Sequence {
    /// Empty itemsets are dropped, so `size()` always counts real itemsets.
    /// Items inside an itemset are ordered by id.
    pub fn new(itemsets: Vec<Itemset>) -> Self {
        let itemsets: Vec<Itemset> = itemsets
            .into_iter()
            .filter(|itemset| !itemset.is_empty())
            .map(|mut itemset| {
                itemset.sort_by_key(|item| item.id);
                itemset
            })
            .collect();
        let utility = itemsets.iter().flatten().map(|item| item.utility).sum();
        Self { itemsets, utility }
    }

    /// Build a sequence from nested `(id, utility)` pairs.
    ///
    /// ```rust
    /// use high_utility_pattern::Sequence;
    ///
    /// let sequence = Sequence::from_pairs(vec![vec![(1, 1.0), (2, 2.0)], vec![(1, 3.0)]]);
    /// assert_eq!(sequence.size(), 2);
    /// assert_eq!(sequence.utility(), 6.0);
    /// ```
    pub fn from_pairs<I, S>(itemsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = (ItemId, Utility)>,
    {
        itemsets
            .into_iter()
            .map(|itemset| {
                itemset
                    .into_iter()
                    .map(|(id, utility)| Item::new(id, utility))
                    .collect::<Itemset>()
            })
            .collect()
    }

    /// Number of itemsets.
    pub fn size(&self) -> usize {
        self.itemsets.len()
    }

    pub fn utility(&self) -> Utility {
        self.utility
    }

    pub fn itemsets(&self) -> &[Itemset] {
        &self.itemsets
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }
}

impl FromIterator<Itemset> for Sequence {
    fn from_iter<I: IntoIterator<Item = Itemset>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Read-only database of sequences keyed by sequence id.
///
/// Ids are not required to be dense: the reducer keeps the original ids of
/// the sequences it retains.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceStore {
    sequences: BTreeMap<SequenceId, Sequence>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty sequences are not stored.
    pub fn insert(&mut self, id: SequenceId, sequence: Sequence) {
        if !sequence.is_empty() {
            self.sequences.insert(id, sequence);
        }
    }

    pub fn get(&self, id: SequenceId) -> Option<&Sequence> {
        self.sequences.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, SequenceId, Sequence> {
        self.sequences.iter()
    }

    /// Total number of item occurrences in the database.
    pub fn item_count(&self) -> usize {
        self.sequences
            .values()
            .flat_map(|sequence| sequence.itemsets())
            .map(Vec::len)
            .sum()
    }

    /// Itemset count of a sequence the caller knows to be present.
    pub(crate) fn size_of(&self, id: SequenceId) -> usize {
        match self.sequences.get(&id) {
            Some(sequence) => sequence.size(),
            None => panic!("sequence {} is not in the store", id),
        }
    }
}

impl<'a> IntoIterator for &'a SequenceStore {
    type Item = (&'a SequenceId, &'a Sequence);
    type IntoIter = btree_map::Iter<'a, SequenceId, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Collects sequences under dense ids `0, 1, 2, ...` in iteration order.
impl FromIterator<Sequence> for SequenceStore {
    fn from_iter<I: IntoIterator<Item = Sequence>>(iter: I) -> Self {
        iter.into_iter()
            .enumerate()
            .map(|(id, sequence)| (id as SequenceId, sequence))
            .collect()
    }
}

impl FromIterator<(SequenceId, Sequence)> for SequenceStore {
    fn from_iter<I: IntoIterator<Item = (SequenceId, Sequence)>>(iter: I) -> Self {
        let mut store = SequenceStore::new();
        for (id, sequence) in iter {
            store.insert(id, sequence);
        }
        store
    }
}
