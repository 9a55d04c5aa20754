//! Storage for published snapshots and trees.
//!
//! This module provides:
//! - In-memory registries that publish immutable values atomically
//! - The `ArchiveStore` trait with in-memory and filesystem backends

pub mod archive;
pub mod registry;

pub use archive::{ArchiveError, ArchiveStore, FsArchive, MemoryArchive};
pub use registry::{Occupied, Registry, SnapshotRegistry, TreeRegistry};
