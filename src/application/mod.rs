//! Application Layer - Use cases
//!
//! Wires the domain, ports and configuration together.

pub mod assessor;
pub mod bootstrap;

pub use assessor::{Assessor, BatchResult};
pub use bootstrap::{apply_overrides, build_store};
