//! Storage layer for persisted hologram definitions.
//!
//! The host hands the registry a flat, string-keyed property tree. This module
//! defines that contract ([`ConfigStore`], opened through a
//! [`StorageProvider`]) and ships two implementations:
//! - [`InMemoryStorage`] for tests and embedding without a disk
//! - [`FileStorage`] writing one JSON document per store
//!
//! Key naming lives in [`keys`]; nothing else in the crate builds key strings.

mod error;
mod file;
pub mod keys;
mod memory;
mod traits;

pub use error::{Result, StoreError};
pub use file::{FileStorage, FileStore};
pub use memory::{InMemoryStorage, InMemoryStore};
pub use traits::{ConfigStore, StorageProvider, StoreValue};
