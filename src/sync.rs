//! A module which decides which synchronization primitives to use throughout the rest of the crate
//! depending on features and configuration options

cfg_if::cfg_if! {
    if #[cfg(feature = "shuttle")] {
        pub(crate) use shuttle::sync::atomic::{AtomicU8, Ordering};
    } else {
        pub(crate) use std::sync::atomic::{AtomicU8, Ordering};
    }
}

pub(crate) use std::sync::Arc;
