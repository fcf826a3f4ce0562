use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::pattern::{is_contained_by, Pattern};

/// What the repository decided about one candidate.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct InsertOutcome {
    /// The candidate was stored as a closed pattern.
    pub closed: bool,
    /// A same-support superpattern with the same SE exists, so no
    /// sequence-extension of the candidate can be closed.
    pub stop_sequence_extension: bool,
    /// The superpattern also has the same SLIP: the candidate's subtree is
    /// covered entirely.
    pub prune: bool,
    /// Stored patterns removed because the candidate contains them.
    pub evicted: usize,
}

/// Closed patterns sharing one support value.
#[derive(Debug, Default)]
struct Bucket {
    /// Largest itemset count among `patterns`, 0 when empty.
    max_size: usize,
    patterns: Vec<Pattern>,
}

impl Bucket {
    fn insert(&mut self, candidate: &Pattern) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();

        if candidate.size() > self.max_size {
            // Nothing here is large enough to contain the candidate.
            let before = self.patterns.len();
            self.patterns.retain(|member| {
                !(same_sequences(candidate, member) && is_contained_by(candidate.name(), member.name()))
            });
            outcome.evicted = before - self.patterns.len();
        } else {
            let mut i = 0;
            while i < self.patterns.len() {
                let member = &self.patterns[i];
                if !same_sequences(candidate, member) {
                    i += 1;
                } else if member.size() >= candidate.size() && member.name().len() >= candidate.name().len() {
                    if is_contained_by(member.name(), candidate.name()) {
                        if member.se() == candidate.se() {
                            outcome.stop_sequence_extension = true;
                            outcome.prune = member.slip() == candidate.slip();
                        }
                        trace!(candidate = %candidate, by = %member, "not closed");
                        return outcome;
                    }
                    i += 1;
                } else if is_contained_by(candidate.name(), member.name()) {
                    self.patterns.remove(i);
                    outcome.evicted += 1;
                } else {
                    i += 1;
                }
            }
        }

        if outcome.evicted > 0 {
            debug!(candidate = %candidate, evicted = outcome.evicted, "superseded closed patterns");
            self.max_size = self.patterns.iter().map(Pattern::size).max().unwrap_or(0);
        }
        self.max_size = self.max_size.max(candidate.size());
        self.patterns.push(candidate.clone());
        debug_assert_eq!(
            Some(self.max_size),
            self.patterns.iter().map(Pattern::size).max(),
            "bucket max size out of sync"
        );

        outcome.closed = true;
        outcome
    }
}

/// Patterns dominate each other only when they occur in exactly the same
/// sequences; equal support is necessary but not sufficient.
fn same_sequences(a: &Pattern, b: &Pattern) -> bool {
    a.occurrences().keys().eq(b.occurrences().keys())
}

/// Closed high-utility patterns found so far, bucketed by support.
///
/// Patterns of different support never dominate each other, so each bucket
/// is locked on its own; the outer lock is only taken for writing when a
/// support value is seen for the first time.
#[derive(Debug, Default)]
pub struct ClosureRepository {
    buckets: RwLock<BTreeMap<usize, Mutex<Bucket>>>,
}

impl ClosureRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `candidate` if no stored pattern over the same sequences
    /// contains it, removing the stored patterns over those sequences it
    /// contains.
    ///
    /// The scan and the mutation happen under one bucket lock.
    pub fn insert(&self, candidate: &Pattern) -> InsertOutcome {
        let support = candidate.support();
        {
            let buckets = self.buckets.read().expect("closure repository poisoned");
            if let Some(bucket) = buckets.get(&support) {
                return bucket
                    .lock()
                    .expect("closure bucket poisoned")
                    .insert(candidate);
            }
        }

        let mut buckets = self.buckets.write().expect("closure repository poisoned");
        buckets
            .entry(support)
            .or_default()
            .get_mut()
            .expect("closure bucket poisoned")
            .insert(candidate)
    }

    pub fn len(&self) -> usize {
        self.buckets
            .read()
            .expect("closure repository poisoned")
            .values()
            .map(|bucket| bucket.lock().expect("closure bucket poisoned").patterns.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored patterns, ordered by descending support then name, with
    /// `is_maximal` set on those no other stored pattern contains.
    pub fn into_patterns(self) -> Vec<Pattern> {
        let buckets = self
            .buckets
            .into_inner()
            .expect("closure repository poisoned");
        let mut patterns: Vec<Pattern> = buckets
            .into_iter()
            .flat_map(|(_, bucket)| {
                bucket
                    .into_inner()
                    .expect("closure bucket poisoned")
                    .patterns
            })
            .collect();

        patterns.par_sort_unstable_by(|a, b| {
            (Reverse(a.support()), a.name()).cmp(&(Reverse(b.support()), b.name()))
        });
        mark_maximal(&mut patterns);
        patterns
    }
}

/// Flag every pattern that no other pattern in `patterns` contains.
pub fn mark_maximal(patterns: &mut [Pattern]) {
    let flags: Vec<bool> = patterns
        .par_iter()
        .map(|pattern| {
            !patterns.iter().any(|other| {
                other.name().len() > pattern.name().len()
                    && is_contained_by(other.name(), pattern.name())
            })
        })
        .collect();

    for (pattern, is_maximal) in patterns.iter_mut().zip(flags) {
        pattern.is_maximal = is_maximal;
    }
}
