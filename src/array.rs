use crate::casn::{canonicalize, casn, CasnWord};
use crate::err::Error;
use crate::slot::Slot;
use crate::types::SlotIndex;
use core::fmt::{Debug, Formatter};
use crossbeam_epoch::Guard;
use tracing::instrument;

/// A fixed-size array of atomic slots supporting linearizable single- and multi-slot
/// compare-and-swap.
///
/// Multi-slot operations install transient descriptors into the slots they touch. Every operation
/// helps any descriptor it meets to completion before proceeding, so a stalled thread never
/// blocks the others and no caller ever observes a half-applied update.
///
/// Memory of replaced values and finished descriptors is reclaimed through `crossbeam_epoch`;
/// every operation pins the calling thread for its duration.
pub struct AtomicArray<T> {
    slots: Box<[Slot<T>]>,
}

impl<T> AtomicArray<T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn check_index(&self, index: SlotIndex) -> Result<(), Error> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                index,
                len: self.slots.len(),
            })
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> AtomicArray<T> {
    /// Create an array of `size` slots, each holding `initial`.
    pub fn new(size: usize, initial: T) -> Self {
        (0..size).map(|_| initial.clone()).collect()
    }

    /// Read the value at `index`.
    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, index: SlotIndex) -> Result<T, Error> {
        self.check_index(index)?;
        let guard: Guard = crossbeam_epoch::pin();
        Ok(self.slots[index].get(&self.slots, &guard))
    }

    /// Unconditionally store `value` at `index`.
    #[instrument(level = "trace", skip(self, value))]
    pub fn set(&self, index: SlotIndex, value: T) -> Result<(), Error> {
        self.check_index(index)?;
        let guard: Guard = crossbeam_epoch::pin();
        self.slots[index].set(value, &self.slots, &guard);
        Ok(())
    }

    /// Replace the value at `index` with `update` if it currently equals `expected`.
    ///
    /// Returns `Ok(false)` without retrying if the value differs.
    #[instrument(level = "trace", skip(self, expected, update))]
    pub fn cas(&self, index: SlotIndex, expected: T, update: T) -> Result<bool, Error> {
        self.check_index(index)?;
        let guard: Guard = crossbeam_epoch::pin();
        Ok(self.slots[index].compare_and_set(&expected, update, &self.slots, &guard))
    }

    /// Atomically replace the values at `index1` and `index2` if both currently equal their
    /// expected values.
    ///
    /// If both indices are the same slot, the call fails when `expected1 != expected2` and
    /// otherwise behaves like `cas(index1, expected1, update2)`.
    #[allow(clippy::too_many_arguments)]
    pub fn cas2(
        &self,
        index1: SlotIndex,
        expected1: T,
        update1: T,
        index2: SlotIndex,
        expected2: T,
        update2: T,
    ) -> Result<bool, Error> {
        self.casn(&[
            CasnWord::new(index1, expected1, update1),
            CasnWord::new(index2, expected2, update2),
        ])
    }

    /// Atomically apply every word of `words` if every slot currently holds its expected value.
    ///
    /// Words may come in any order. Words on the same slot must agree on the expected value or the
    /// call fails; the last of them supplies the desired value. An empty list trivially succeeds.
    #[instrument(level = "trace", skip_all, fields(num_words = words.len()))]
    pub fn casn(&self, words: &[CasnWord<T>]) -> Result<bool, Error> {
        for word in words {
            self.check_index(word.index())?;
        }
        let words: Vec<CasnWord<T>> = match canonicalize(words) {
            Some(words) => words,
            None => return Ok(false),
        };

        let guard: Guard = crossbeam_epoch::pin();
        match words.len() {
            0 => Ok(true),
            1 => {
                let word: &CasnWord<T> = &words[0];
                Ok(self.slots[word.index()].compare_and_set(
                    word.expected(),
                    word.desired().clone(),
                    &self.slots,
                    &guard,
                ))
            }
            _ => Ok(casn(&self.slots, words, &guard)),
        }
    }
}

impl<T> From<Vec<T>> for AtomicArray<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T> FromIterator<T> for AtomicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().map(Slot::new).collect(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + Debug + 'static> Debug for AtomicArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let guard: Guard = crossbeam_epoch::pin();
        f.debug_list()
            .entries(self.slots.iter().map(|slot| slot.get(&self.slots, &guard)))
            .finish()
    }
}
