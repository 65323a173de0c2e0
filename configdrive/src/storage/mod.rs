//! Storage operations (mount table, scoped mounts, tree copy).
//!
//! - Mount table: snapshot of what the OS reports as mounted
//! - Mount: read-only mounts with guaranteed cleanup
//! - Copy: recursive copy of a mounted tree to its destination

mod copy;
mod mount;
mod mount_table;

pub use copy::copy_tree;
pub use mount::{MountManager, MountOwnership, MountedDevice, ScratchDir};
pub use mount_table::{MountRecord, MountTable, read_mounts};
