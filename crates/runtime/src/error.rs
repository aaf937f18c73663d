//! Errors surfaced by the registry API.
//!
//! Per-record problems found while loading are logged and skipped, so they
//! never show up here. What remains are storage failures, which are passed
//! through untouched, and misuse of the API.
use thiserror::Error;

pub use crate::storage::StoreError;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("no active hologram named `{0}`")]
    UnknownHologram(String),
}
