//! Benchmark helpers for kvmigrate.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
