//! A lock-free array of atomic slots with linearizable multi-slot compare-and-swap.
//!
//! [AtomicArray] exposes `get`, `set`, `cas`, `cas2` and the general `casn`. A multi-slot
//! operation installs a shared descriptor into its lowest slot with a plain compare-and-set and
//! then hands every further slot over to it through a restricted double-compare single-swap
//! (RDCSS), which only succeeds while the operation is still undecided. The outcome is decided
//! exactly once; afterwards every slot is either set to its new value or rolled back.
//!
//! Any thread which finds a descriptor in a slot helps it to completion before going on, so an
//! operation whose initiating thread stalls is finished by whoever touches its slots next.
//!
//! ```
//! use casn::AtomicArray;
//!
//! let array: AtomicArray<u32> = AtomicArray::new(5, 0);
//! assert_eq!(array.cas2(0, 0, 1, 3, 0, 1), Ok(true));
//! assert_eq!(array.cas2(0, 0, 2, 3, 1, 2), Ok(false));
//! assert_eq!(array.get(0), Ok(1));
//! assert_eq!(array.get(3), Ok(1));
//! ```

mod array;
mod casn;
pub mod err;
mod outcome;
mod slot;
mod sync;
pub mod types;

pub use crate::array::AtomicArray;
pub use crate::casn::CasnWord;
pub use crate::err::Error;
