use crate::casn::CasnDescriptor;
use crate::outcome::{AtomicOutcome, Outcome};
use crate::slot::{Cell, Slot};
use crate::sync::Arc;
use crate::types::SlotIndex;
use crossbeam_epoch::{Guard, Owned};
use tracing::trace;

/// A restricted double-compare single-swap which hands a slot over to a CASN descriptor.
///
/// The slot held `expected` when this descriptor was installed. The handoff only goes through if
/// the CASN descriptor is still undecided when this descriptor decides; otherwise the slot gets
/// `expected` back, so a stale helper can never claim a slot for an operation which has already
/// finished.
pub(crate) struct RdcssDescriptor<T> {
    casn: Arc<CasnDescriptor<T>>,
    slot_index: SlotIndex,
    expected: T,
    outcome: AtomicOutcome,
}

impl<T> RdcssDescriptor<T> {
    pub(crate) fn new(casn: Arc<CasnDescriptor<T>>, slot_index: SlotIndex, expected: T) -> Self {
        Self {
            casn,
            slot_index,
            expected,
            outcome: AtomicOutcome::new(),
        }
    }

    pub(crate) fn slot_index(&self) -> SlotIndex {
        self.slot_index
    }
}

impl<T: Clone + PartialEq> RdcssDescriptor<T> {
    /// Decide whether the handoff goes through and move the owned slot accordingly.
    ///
    /// Safe to call any number of times from any thread. Returns whether the slot was handed to
    /// the CASN descriptor.
    pub(crate) fn complete(&self, slots: &[Slot<T>], guard: &Guard) -> bool {
        let outcome: Outcome = match self.outcome.load() {
            Outcome::Undecided => {
                let proposal: Outcome = match self.casn.outcome() {
                    Outcome::Undecided => Outcome::Success,
                    Outcome::Success | Outcome::Failed => Outcome::Failed,
                };
                self.outcome.decide(proposal)
            }
            decided => decided,
        };

        let slot: &Slot<T> = &slots[self.slot_index];
        if let Some(current) = slot.holding_rdcss(self, guard) {
            let next: Cell<T> = match outcome {
                Outcome::Success => Cell::Casn(self.casn.clone()),
                _ => Cell::Value(self.expected.clone()),
            };
            if slot.replace(current, Owned::new(next), guard).is_ok() {
                trace!("slot {}: rdcss resolved as {outcome}", self.slot_index);
            }
        }
        outcome == Outcome::Success
    }
}
