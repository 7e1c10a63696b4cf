use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::config::ScoredCombination;

/// A scored combination, tagged with its position in the enumeration.
///
/// Candidates are ordered by reach, then frequency, then by enumeration
/// position: between two candidates with the same scores, the one seen first
/// is the greater. The label never takes part in the ordering.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) seq: u64,
    pub(crate) scored: ScoredCombination,
}

fn compare_scores(reach_a: f64, freq_a: f64, reach_b: f64, freq_b: f64) -> Ordering {
    reach_a
        .total_cmp(&reach_b)
        .then_with(|| freq_a.total_cmp(&freq_b))
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_scores(
            self.scored.reach,
            self.scored.frequency,
            other.scored.reach,
            other.scored.frequency,
        )
        .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Keeps the `capacity` best candidates seen so far.
///
/// The weakest member sits at the top of a min-heap, so that deciding whether a
/// newcomer gets in is a single comparison.
#[derive(Debug)]
pub(crate) struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Candidate>>,
}

// Upper bound on the storage reserved up front; the heap grows past it if needed.
const MAX_RESERVED: usize = 1 << 16;

impl TopK {
    /// `expected` is the number of combinations the run will enumerate. Only
    /// what can actually be kept is reserved, so any `capacity` is accepted.
    pub(crate) fn new(capacity: usize, expected: u128) -> TopK {
        let expected = usize::try_from(expected).unwrap_or(usize::MAX);
        TopK {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(expected).min(MAX_RESERVED)),
        }
    }

    /// True if a candidate with these scores would enter the selection.
    ///
    /// Once full, only a strictly better (reach, frequency) pair gets in: ties
    /// go to the member that was seen first.
    pub(crate) fn admits(&self, reach: f64, frequency: f64) -> bool {
        if self.heap.len() < self.capacity {
            return true;
        }
        match self.heap.peek() {
            Some(Reverse(weakest)) => {
                compare_scores(
                    reach,
                    frequency,
                    weakest.scored.reach,
                    weakest.scored.frequency,
                ) == Ordering::Greater
            }
            None => false,
        }
    }

    pub(crate) fn offer(&mut self, candidate: Candidate) {
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
        } else if let Some(mut weakest) = self.heap.peek_mut() {
            if candidate > weakest.0 {
                *weakest = Reverse(candidate);
            }
        }
    }

    fn into_vec(self) -> Vec<Candidate> {
        self.heap.into_iter().map(|Reverse(c)| c).collect()
    }
}

/// Collects the scored combinations of one run, bounded or not.
#[derive(Debug)]
pub(crate) enum Selector {
    All(Vec<Candidate>),
    Top(TopK),
}

impl Selector {
    pub(crate) fn new(top: Option<usize>, expected: u128) -> Selector {
        match top {
            Some(k) => Selector::Top(TopK::new(k, expected)),
            None => Selector::All(Vec::new()),
        }
    }

    pub(crate) fn admits(&self, reach: f64, frequency: f64) -> bool {
        match self {
            Selector::All(_) => true,
            Selector::Top(top) => top.admits(reach, frequency),
        }
    }

    pub(crate) fn offer(&mut self, candidate: Candidate) {
        match self {
            Selector::All(v) => v.push(candidate),
            Selector::Top(top) => top.offer(candidate),
        }
    }

    /// The final table: best reach first, then best frequency, then
    /// enumeration order.
    pub(crate) fn into_ranked(self) -> Vec<ScoredCombination> {
        let mut candidates = match self {
            Selector::All(v) => v,
            Selector::Top(top) => top.into_vec(),
        };
        candidates.sort_by(|a, b| b.cmp(a));
        candidates.into_iter().map(|c| c.scored).collect()
    }
}
