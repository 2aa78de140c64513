use crate::sync::{AtomicU8, Ordering};
use core::fmt::{Display, Formatter};
use tracing::trace;

/// The decision of a descriptor.
///
/// `Undecided` can transition to either `Success` or `Failed`, exactly once. Both `Success` and
/// `Failed` are terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Outcome {
    /// Nobody has decided yet whether the operation takes effect.
    Undecided = 0,
    /// The operation takes effect: every slot ends up holding its new value.
    Success = 1,
    /// The operation has no effect: every slot ends up holding its original value.
    Failed = 2,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Outcome {
    /// Only [AtomicOutcome] writes the raw byte, so every byte it loads came from an [Outcome].
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Outcome::Undecided,
            1 => Outcome::Success,
            2 => Outcome::Failed,
            _ => unreachable!("outcome byte {raw} was not written by an AtomicOutcome"),
        }
    }
}

/// An [Outcome] which can be decided once by any thread.
#[derive(Debug)]
pub(crate) struct AtomicOutcome {
    raw: AtomicU8,
}

impl AtomicOutcome {
    pub(crate) fn new() -> Self {
        Self {
            raw: AtomicU8::new(Outcome::Undecided as u8),
        }
    }

    pub(crate) fn load(&self) -> Outcome {
        Outcome::from_raw(self.raw.load(Ordering::Acquire))
    }

    /// Propose `proposal` as the outcome and return the outcome which actually holds afterwards.
    ///
    /// If another thread already decided, its decision is returned and `proposal` is discarded.
    pub(crate) fn decide(&self, proposal: Outcome) -> Outcome {
        match self.raw.compare_exchange(
            Outcome::Undecided as u8,
            proposal as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                trace!("decided {proposal}");
                proposal
            }
            Err(actual) => Outcome::from_raw(actual),
        }
    }
}
