use crate::casn::claim::claim_remaining;
use crate::casn::revert::revert;
use crate::casn::set::set;
use crate::outcome::{AtomicOutcome, Outcome};
use crate::slot::{Cell, Slot};
use crate::sync::Arc;
use crate::types::SlotIndex;
use crossbeam_epoch::{Guard, Owned};
use tracing::{instrument, trace};

mod claim;
pub(crate) mod rdcss;
mod revert;
mod set;

/// A structure containing all the information needed for one slot of a CASN operation.
///
/// The slot at `index` is expected to hold `expected`; if every slot of the operation holds its
/// expected value at the same instant, each one is replaced by its `desired` value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CasnWord<T> {
    index: SlotIndex,
    expected: T,
    desired: T,
}

impl<T> CasnWord<T> {
    pub fn new(index: SlotIndex, expected: T, desired: T) -> Self {
        Self {
            index,
            expected,
            desired,
        }
    }

    pub fn index(&self) -> SlotIndex {
        self.index
    }

    pub fn expected(&self) -> &T {
        &self.expected
    }

    pub fn desired(&self) -> &T {
        &self.desired
    }
}

/// Sort `words` by slot index and merge words which target the same slot.
///
/// Two words on one slot can only both hold if they expect the same value; the later word's
/// desired value wins. Returns `None` if the expectations contradict each other, in which case the
/// operation can never succeed.
pub(crate) fn canonicalize<T: Clone + PartialEq>(
    words: &[CasnWord<T>],
) -> Option<Vec<CasnWord<T>>> {
    let mut sorted: Vec<CasnWord<T>> = words.to_vec();
    // stable, so words on the same slot stay in call order
    sorted.sort_by_key(|word| word.index);

    let mut merged: Vec<CasnWord<T>> = Vec::with_capacity(sorted.len());
    for word in sorted {
        match merged.last_mut() {
            Some(last) if last.index == word.index => {
                if last.expected != word.expected {
                    return None;
                }
                last.desired = word.desired;
            }
            _ => merged.push(word),
        }
    }
    Some(merged)
}

/// Coordinates an atomic update across two or more slots.
///
/// The descriptor is first installed into its lowest slot by a plain compare-and-set, then every
/// further slot is handed over through an [rdcss::RdcssDescriptor]. Any thread which meets the
/// descriptor in a slot drives it through [CasnDescriptor::complete].
#[derive(Debug)]
pub(crate) struct CasnDescriptor<T> {
    /// Sorted by ascending slot index, without duplicates.
    words: Vec<CasnWord<T>>,
    outcome: AtomicOutcome,
}

impl<T> CasnDescriptor<T> {
    pub(crate) fn new(words: Vec<CasnWord<T>>) -> Self {
        debug_assert!(words.len() >= 2);
        debug_assert!(words.windows(2).all(|pair| pair[0].index < pair[1].index));
        Self {
            words,
            outcome: AtomicOutcome::new(),
        }
    }

    pub(crate) fn words(&self) -> &[CasnWord<T>] {
        &self.words
    }

    pub(crate) fn outcome(&self) -> Outcome {
        self.outcome.load()
    }

    pub(crate) fn decide(&self, proposal: Outcome) -> Outcome {
        self.outcome.decide(proposal)
    }
}

impl<T: Clone + PartialEq> CasnDescriptor<T> {
    /// Drive this operation to its final state and return whether it succeeded.
    ///
    /// Reentrant and idempotent: any number of threads may call this at any time, before or after
    /// the outcome is decided, and every call converges on the same outcome. Every slot transition
    /// it makes is a CAS guarded on this descriptor still being in place.
    pub(crate) fn complete(self: &Arc<Self>, slots: &[Slot<T>], guard: &Guard) -> bool {
        let outcome: Outcome = match self.outcome() {
            Outcome::Undecided => {
                let proposal: Outcome = claim_remaining(self, slots, guard);
                self.decide(proposal)
            }
            decided => decided,
        };
        match outcome {
            Outcome::Success => {
                set(self, slots, guard);
                true
            }
            _ => {
                revert(self, slots, guard);
                false
            }
        }
    }
}

/// Perform a CASN operation over canonical `words`: at least two, sorted, on distinct slots.
#[instrument(level = "trace", skip_all, fields(num_words = words.len()))]
pub(crate) fn casn<T: Clone + PartialEq>(
    slots: &[Slot<T>],
    words: Vec<CasnWord<T>>,
    guard: &Guard,
) -> bool {
    let descriptor: Arc<CasnDescriptor<T>> = Arc::new(CasnDescriptor::new(words));
    let first: &CasnWord<T> = &descriptor.words[0];

    let installed: bool = slots[first.index].compare_and_set_cell(
        &first.expected,
        Owned::new(Cell::Casn(descriptor.clone())),
        slots,
        guard,
    );
    if !installed {
        trace!("slot {}: did not hold the expected value", first.index);
        return false;
    }
    descriptor.complete(slots, guard)
}
