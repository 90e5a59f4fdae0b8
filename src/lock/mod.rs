//! Per-character exclusive access.
//!
//! Any mutation of a character's state goes through a [`Locked`] handle
//! obtained from the [`LockRegistry`]. The handle is held for the whole outer
//! operation, including script suspensions, and released when dropped.

mod handle;
mod registry;

pub use handle::Locked;
pub use registry::LockRegistry;
