use crate::casn::rdcss::RdcssDescriptor;
use crate::casn::{CasnDescriptor, CasnWord};
use crate::outcome::Outcome;
use crate::slot::{Cell, Slot};
use crate::sync::Arc;
use crate::types::WordNum;
use core::ptr;
use crossbeam_epoch::{Guard, Owned, Shared};
use tracing::{instrument, trace};

/// Claim every slot after the first for `casn` by handing it over through an RDCSS, in ascending
/// slot order. Then, propose [Outcome::Success] if every slot was claimed, or [Outcome::Failed] as
/// soon as one slot is found holding a value other than the expected one.
///
/// The first slot is claimed before the descriptor becomes visible, so it never needs claiming
/// here. A claimed slot keeps the descriptor until the outcome is decided.
#[instrument(level = "trace", skip_all)]
pub(super) fn claim_remaining<T: Clone + PartialEq>(
    casn: &Arc<CasnDescriptor<T>>,
    slots: &[Slot<T>],
    guard: &Guard,
) -> Outcome {
    for word_num in 1..casn.words().len() {
        if !claim(casn, word_num, slots, guard) {
            return Outcome::Failed;
        }
    }
    Outcome::Success
}

/// Returns whether the slot of word `word_num` now holds `casn`.
fn claim<T: Clone + PartialEq>(
    casn: &Arc<CasnDescriptor<T>>,
    word_num: WordNum,
    slots: &[Slot<T>],
    guard: &Guard,
) -> bool {
    let word: &CasnWord<T> = &casn.words()[word_num];
    let slot: &Slot<T> = &slots[word.index()];
    loop {
        // somebody else decided already; whatever we would find no longer matters
        if casn.outcome() != Outcome::Undecided {
            return false;
        }

        let current: Shared<Cell<T>> = slot.load(guard);
        // SAFETY: slots are never null and `guard` keeps the cell alive.
        match unsafe { current.deref() } {
            Cell::Casn(installed) if ptr::eq(&**installed, &**casn) => {
                trace!("slot {}: already claimed", word.index());
                return true;
            }
            Cell::Value(value) if value == word.expected() => {
                let rdcss: RdcssDescriptor<T> =
                    RdcssDescriptor::new(casn.clone(), word.index(), value.clone());
                let rdcss: Owned<Cell<T>> = Owned::new(Cell::Rdcss(rdcss));
                if let Ok(installed) = slot.replace(current, rdcss, guard) {
                    // SAFETY: `installed` was just swapped in and `guard` keeps it alive.
                    if let Cell::Rdcss(rdcss) = unsafe { installed.deref() } {
                        rdcss.complete(slots, guard);
                    }
                }
                // whoever completed the handoff, the next load tells how it went
            }
            Cell::Value(_) => {
                trace!("slot {}: did not hold the expected value", word.index());
                return false;
            }
            // a handoff in flight, ours or another operation's
            descriptor => descriptor.help(slots, guard),
        }
    }
}
