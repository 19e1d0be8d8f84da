//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `strata-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `PageConfigLoader`: Feature and page discovery
//!   - `Formatter`: Post-generation formatting
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{Filesystem, Formatter, PageConfigLoader};

#[cfg(test)]
pub use output::{MockFilesystem, MockFormatter, MockPageConfigLoader};
