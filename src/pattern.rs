use std::collections::BTreeMap;
use std::fmt;

use crate::sequence::{ItemId, SequenceId, SequenceStore, Utility};

/// One occurrence of a pattern inside one sequence.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ItemInstance {
    /// Pattern utility accumulated at this occurrence.
    pub utility: Utility,
    /// Sequence utility strictly after this occurrence.
    pub rem: Utility,
    /// Itemset index of the occurrence's last item.
    pub position: usize,
}

impl ItemInstance {
    pub fn new(utility: Utility, rem: Utility, position: usize) -> Self {
        Self {
            utility,
            rem,
            position,
        }
    }
}

/// Sequence-ID utility list: per sequence, occurrences in increasing position.
pub type Occurrences = BTreeMap<SequenceId, Vec<ItemInstance>>;

#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Token {
    Item(ItemId),
    /// Closes one itemset and opens the next.
    Separator,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Item(id) => write!(f, "{}", id),
            Token::Separator => write!(f, "-1"),
        }
    }
}

/// True when `sub_name` is an order-preserving, not necessarily contiguous,
/// subsequence of `super_name`.
pub fn is_contained_by(super_name: &[Token], sub_name: &[Token]) -> bool {
    let mut pending = sub_name.iter().peekable();
    for token in super_name {
        if pending.peek() == Some(&token) {
            pending.next();
        }
    }
    pending.peek().is_none()
}

/// A node of the search tree: a sequence of itemsets with its occurrence list
/// and the bound metrics derived from it.
///
/// Metrics are computed once in the constructor. Only the bookkeeping flags
/// change afterwards, and only on the node that owns the pattern.
#[derive(Clone)]
pub struct Pattern {
    name: Vec<Token>,
    last_item: ItemId,
    size: usize,
    occurrences: Occurrences,
    rbu: Utility,
    umin: Utility,
    se: usize,
    slip: usize,
    pub(crate) is_sequence_extension: bool,
    pub(crate) is_parent_sequence_extension: bool,
    pub(crate) parent_last_item: Option<ItemId>,
    pub(crate) do_itemset_extend: bool,
    pub(crate) do_sequence_extend: bool,
    pub(crate) is_maximal: bool,
}

impl Pattern {
    pub(crate) fn new(
        name: Vec<Token>,
        last_item: ItemId,
        size: usize,
        occurrences: Occurrences,
        store: &SequenceStore,
    ) -> Self {
        let mut pattern = Self {
            name,
            last_item,
            size,
            occurrences,
            rbu: 0.0,
            umin: 0.0,
            se: 0,
            slip: 0,
            is_sequence_extension: true,
            is_parent_sequence_extension: true,
            parent_last_item: None,
            do_itemset_extend: true,
            do_sequence_extend: true,
            is_maximal: false,
        };
        pattern.measure(store);
        pattern
    }

    /// Single-item pattern, the root of one search subtree.
    pub(crate) fn single(item: ItemId, occurrences: Occurrences, store: &SequenceStore) -> Self {
        Self::new(vec![Token::Item(item)], item, 1, occurrences, store)
    }

    fn measure(&mut self, store: &SequenceStore) {
        for (&sid, instances) in &self.occurrences {
            let first = match instances.first() {
                Some(first) => first,
                None => panic!("pattern {} has an empty list for sequence {}", self, sid),
            };
            assert!(
                instances.windows(2).all(|w| w[0].position < w[1].position),
                "occurrences of {} in sequence {} are not position-sorted",
                self,
                sid
            );

            self.umin += instances
                .iter()
                .map(|instance| instance.utility)
                .fold(Utility::INFINITY, Utility::min);
            self.rbu += first.utility + first.rem;
            self.se += store.size_of(sid) - first.position;
            self.slip += instances.len();
        }
    }

    pub fn name(&self) -> &[Token] {
        &self.name
    }

    pub fn last_item(&self) -> ItemId {
        self.last_item
    }

    /// Number of itemsets.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of sequences the pattern occurs in.
    pub fn support(&self) -> usize {
        self.occurrences.len()
    }

    pub fn occurrences(&self) -> &Occurrences {
        &self.occurrences
    }

    /// Upper bound on the utility of any superpattern grown from here.
    pub fn rbu(&self) -> Utility {
        self.rbu
    }

    pub fn umin(&self) -> Utility {
        self.umin
    }

    pub fn se(&self) -> usize {
        self.se
    }

    pub fn slip(&self) -> usize {
        self.slip
    }

    pub fn is_sequence_extension(&self) -> bool {
        self.is_sequence_extension
    }

    pub fn is_parent_sequence_extension(&self) -> bool {
        self.is_parent_sequence_extension
    }

    pub fn parent_last_item(&self) -> Option<ItemId> {
        self.parent_last_item
    }

    pub fn do_itemset_extend(&self) -> bool {
        self.do_itemset_extend
    }

    pub fn do_sequence_extend(&self) -> bool {
        self.do_sequence_extend
    }

    pub fn is_maximal(&self) -> bool {
        self.is_maximal
    }

    /// First occurrence of the pattern in `sid`, if it occurs there.
    pub(crate) fn first_in(&self, sid: SequenceId) -> Option<&ItemInstance> {
        self.occurrences.get(&sid).and_then(|instances| instances.first())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut tokens = self.name.iter();
        if let Some(token) = tokens.next() {
            write!(f, "{}", token)?;
        }
        for token in tokens {
            write!(f, " {}", token)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Pattern: {}, lastItem: {}, RBU: {}, umin: {}, SE: {}, SLIP: {}",
            self, self.last_item, self.rbu, self.umin, self.se, self.slip
        )?;
        for (sid, instances) in &self.occurrences {
            write!(f, "  {}:", sid)?;
            for instance in instances {
                write!(
                    f,
                    " {}/{}/{}",
                    instance.position, instance.utility, instance.rem
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
