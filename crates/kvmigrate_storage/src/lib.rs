//! # kvmigrate Storage
//!
//! Key-value backend trait and implementations for kvmigrate.
//!
//! This crate provides the storage abstraction the migration engine talks
//! to. Backends are **opaque key-value stores** over a hierarchical
//! namespace - they do not know they are being migrated.
//!
//! ## Design Principles
//!
//! - Backends expose exactly three calls: list, get, put
//! - Keys are `/`-separated paths; a trailing `/` marks a sub-namespace
//! - A missing value is `Ok(None)`, never an error
//! - Must be `Send + Sync` so transfer workers can share them
//! - Backends are built by name through an explicitly populated
//!   [`BackendRegistry`]
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] (`inmem`) - For testing and ephemeral stores
//! - [`FileBackend`] (`file`) - Directory-tree store on the local filesystem
//!
//! ## Example
//!
//! ```rust
//! use kvmigrate_storage::{Entry, InMemoryBackend, KvBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.put(&Entry::new("a", b"1".to_vec())).unwrap();
//! let entry = backend.get("a").unwrap().unwrap();
//! assert_eq!(entry.value, b"1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod registry;

pub use backend::{is_namespace, Entry, KvBackend, StorageKey, SEPARATOR};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use registry::{BackendConfig, BackendFactory, BackendRegistry};
