//! Storage backends for tallybook
//!
//! Two implementations of the `tally-core` storage protocol:
//! - [`MemoryStore`]: DashMap-backed, records live as long as the process
//! - [`FileStore`]: JSON snapshot on disk, records survive a restart
//!
//! Both apply writes through compare-and-swap, so ledger read-modify-write
//! loops behave identically whichever backend is plugged in.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod file;
pub mod memory;

// Re-exports
pub use file::FileStore;
pub use memory::MemoryStore;
