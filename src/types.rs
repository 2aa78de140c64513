/// The position of a [crate::slot::Slot] inside an [crate::AtomicArray].
///
/// Multi-slot operations acquire slots in ascending `SlotIndex` order, so two operations racing
/// over overlapping slots always contend on the lowest shared slot first.
pub type SlotIndex = usize;

/// The position of a word inside a single CASN operation, after canonical ordering.
pub(crate) type WordNum = usize;
