//! # kvmigrate Testkit
//!
//! Test utilities for kvmigrate.
//!
//! This crate provides:
//! - Shared source/destination fixtures and namespace shapes
//! - Backends that inject failures, hide keys, panic or stall
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use kvmigrate_testkit::prelude::*;
//!
//! let pair = SharedPair::new(scenarios::small_tree());
//! let registry = pair.registry();
//! assert!(registry.contains("source"));
//! assert!(registry.contains("destination"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
