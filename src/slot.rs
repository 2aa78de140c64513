use crate::casn::rdcss::RdcssDescriptor;
use crate::casn::CasnDescriptor;
use crate::sync::{Arc, Ordering};
use core::ptr;
use crossbeam_epoch::{Atomic, Guard, Owned, Shared};
use tracing::trace;

/// The content of a [Slot]: either a plain value or a pending descriptor.
///
/// Every `Cell` lives in its own epoch-managed allocation. Once a `Cell` has been swapped out of a
/// slot it is never installed again, so comparing cell addresses under a pinned [Guard] is enough
/// to identify a descriptor.
pub(crate) enum Cell<T> {
    Value(T),
    Rdcss(RdcssDescriptor<T>),
    Casn(Arc<CasnDescriptor<T>>),
}

impl<T: Clone + PartialEq> Cell<T> {
    /// Drive whatever descriptor this cell holds to completion. Plain values need no help.
    pub(crate) fn help(&self, slots: &[Slot<T>], guard: &Guard) {
        match self {
            Cell::Value(_) => {}
            Cell::Rdcss(rdcss) => {
                trace!("helping rdcss descriptor on slot {}", rdcss.slot_index());
                rdcss.complete(slots, guard);
            }
            Cell::Casn(casn) => {
                trace!("helping casn descriptor over {} slots", casn.words().len());
                casn.complete(slots, guard);
            }
        }
    }
}

/// A single atomic cell of an [crate::AtomicArray].
///
/// Callers outside the descriptor protocol only ever observe plain values: any descriptor met on
/// the way is helped to completion first.
pub(crate) struct Slot<T> {
    cell: Atomic<Cell<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            cell: Atomic::new(Cell::Value(value)),
        }
    }

    pub(crate) fn load<'g>(&self, guard: &'g Guard) -> Shared<'g, Cell<T>> {
        self.cell.load(Ordering::Acquire, guard)
    }

    /// Swap `current` out for `new`, returning the installed cell if the swap won.
    ///
    /// The winner of the swap is the only thread which can observe `current` leaving the slot, so
    /// it is the one to retire it.
    pub(crate) fn replace<'g>(
        &self,
        current: Shared<'g, Cell<T>>,
        new: Owned<Cell<T>>,
        guard: &'g Guard,
    ) -> Result<Shared<'g, Cell<T>>, Owned<Cell<T>>> {
        match self
            .cell
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire, guard)
        {
            Ok(installed) => {
                // SAFETY: `current` is unlinked and cells are never reinstalled, so only threads
                // pinned before this point can still hold it.
                unsafe { guard.defer_destroy(current) };
                Ok(installed)
            }
            Err(error) => Err(error.new),
        }
    }

    /// Returns the current cell if it is exactly `casn`.
    pub(crate) fn holding_casn<'g>(
        &self,
        casn: &CasnDescriptor<T>,
        guard: &'g Guard,
    ) -> Option<Shared<'g, Cell<T>>> {
        let current: Shared<Cell<T>> = self.load(guard);
        // SAFETY: slots are never null and `guard` keeps the cell alive.
        match unsafe { current.deref() } {
            Cell::Casn(installed) if ptr::eq(&**installed, casn) => Some(current),
            _ => None,
        }
    }

    /// Returns the current cell if it is exactly `rdcss`.
    pub(crate) fn holding_rdcss<'g>(
        &self,
        rdcss: &RdcssDescriptor<T>,
        guard: &'g Guard,
    ) -> Option<Shared<'g, Cell<T>>> {
        let current: Shared<Cell<T>> = self.load(guard);
        // SAFETY: slots are never null and `guard` keeps the cell alive.
        match unsafe { current.deref() } {
            Cell::Rdcss(installed) if ptr::eq(installed, rdcss) => Some(current),
            _ => None,
        }
    }
}

impl<T: Clone + PartialEq> Slot<T> {
    pub(crate) fn get(&self, slots: &[Slot<T>], guard: &Guard) -> T {
        loop {
            let current: Shared<Cell<T>> = self.load(guard);
            // SAFETY: slots are never null and `guard` keeps the cell alive.
            match unsafe { current.deref() } {
                Cell::Value(value) => return value.clone(),
                descriptor => descriptor.help(slots, guard),
            }
        }
    }

    pub(crate) fn set(&self, value: T, slots: &[Slot<T>], guard: &Guard) {
        let mut new: Owned<Cell<T>> = Owned::new(Cell::Value(value));
        loop {
            let current: Shared<Cell<T>> = self.load(guard);
            // SAFETY: slots are never null and `guard` keeps the cell alive.
            match unsafe { current.deref() } {
                Cell::Value(_) => match self.replace(current, new, guard) {
                    Ok(_) => return,
                    Err(returned) => new = returned,
                },
                descriptor => descriptor.help(slots, guard),
            }
        }
    }

    pub(crate) fn compare_and_set(
        &self,
        expected: &T,
        update: T,
        slots: &[Slot<T>],
        guard: &Guard,
    ) -> bool {
        self.compare_and_set_cell(expected, Owned::new(Cell::Value(update)), slots, guard)
    }

    /// Install `new` if the slot currently holds a value equal to `expected`.
    ///
    /// Descriptors are helped and the check restarts, since completing them may change the value.
    /// A different value fails immediately.
    pub(crate) fn compare_and_set_cell(
        &self,
        expected: &T,
        mut new: Owned<Cell<T>>,
        slots: &[Slot<T>],
        guard: &Guard,
    ) -> bool {
        loop {
            let current: Shared<Cell<T>> = self.load(guard);
            // SAFETY: slots are never null and `guard` keeps the cell alive.
            match unsafe { current.deref() } {
                Cell::Value(value) if value == expected => match self.replace(current, new, guard) {
                    Ok(_) => return true,
                    Err(returned) => new = returned,
                },
                Cell::Value(_) => return false,
                descriptor => descriptor.help(slots, guard),
            }
        }
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can be reading this slot.
        unsafe {
            let guard: &Guard = crossbeam_epoch::unprotected();
            let current: Shared<Cell<T>> = self.cell.load(Ordering::Relaxed, guard);
            if !current.is_null() {
                drop(current.into_owned());
            }
        }
    }
}
