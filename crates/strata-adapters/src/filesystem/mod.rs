//! [`Filesystem`](strata_core::application::Filesystem) implementations.
//!
//! `LocalFilesystem` backs the CLI. `MemoryFilesystem` keeps generated files
//! in a shared map so pipelines can run without touching disk.

mod local;
mod memory;

pub use local::LocalFilesystem;
pub use memory::MemoryFilesystem;
