use crate::casn::CasnDescriptor;
use crate::slot::{Cell, Slot};
use crossbeam_epoch::{Guard, Owned};
use tracing::{instrument, trace};

/// Swap `casn` out of every slot it still occupies for the desired value.
///
/// Only called once the outcome is [crate::outcome::Outcome::Success]. A slot which no longer
/// holds the descriptor has already been set by another helper.
#[instrument(level = "trace", skip_all)]
pub(super) fn set<T: Clone>(casn: &CasnDescriptor<T>, slots: &[Slot<T>], guard: &Guard) {
    for word in casn.words() {
        let slot: &Slot<T> = &slots[word.index()];
        if let Some(current) = slot.holding_casn(casn, guard) {
            let desired: Owned<Cell<T>> = Owned::new(Cell::Value(word.desired().clone()));
            if slot.replace(current, desired, guard).is_ok() {
                trace!("slot {}: set to desired value", word.index());
            }
        }
    }
}
