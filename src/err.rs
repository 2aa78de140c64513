use crate::types::SlotIndex;
use displaydoc::Display;

/// Any error which can occur during an [crate::AtomicArray] operation.
///
/// A compare-and-swap whose expectations do not hold is not an error: it is reported as
/// `Ok(false)`.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// Index {index} is out of bounds for an array of length {len}.
    IndexOutOfBounds { index: SlotIndex, len: usize },
}

impl std::error::Error for Error {}
