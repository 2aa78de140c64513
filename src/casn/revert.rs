use crate::casn::CasnDescriptor;
use crate::slot::{Cell, Slot};
use crossbeam_epoch::{Guard, Owned};
use tracing::{instrument, trace};

/// Put the expected value back into every slot `casn` still occupies.
///
/// Only called once the outcome is [crate::outcome::Outcome::Failed]. Walks the words in reverse,
/// although any order leaves the same values behind. Even if a slot no longer holds the
/// descriptor, keep reverting the remaining ones.
#[instrument(level = "trace", skip_all)]
pub(super) fn revert<T: Clone>(casn: &CasnDescriptor<T>, slots: &[Slot<T>], guard: &Guard) {
    for word in casn.words().iter().rev() {
        let slot: &Slot<T> = &slots[word.index()];
        if let Some(current) = slot.holding_casn(casn, guard) {
            let expected: Owned<Cell<T>> = Owned::new(Cell::Value(word.expected().clone()));
            if slot.replace(current, expected, guard).is_ok() {
                trace!("slot {}: reverted to expected value", word.index());
            }
        }
    }
}
