//! Runtime side of the hologram system.
//!
//! This crate owns the in-memory registry of active holograms and keeps it in
//! sync with a host-provided key/value store. Hosts embed
//! [`HologramRegistry`], hand it their collaborators through
//! [`HostServices`], and drive it from their plugin lifecycle.
//!
//! Modules are organized by responsibility:
//! - [`registry`] hosts the registry and its load/save protocol
//! - [`storage`] defines the store contract plus memory and file backends
//! - [`host`] bundles injected host services and an in-memory spawner
//! - [`config`] and [`error`] provide the ambient configuration and errors
pub mod config;
pub mod error;
pub mod host;
pub mod registry;
pub mod storage;

pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use host::{HostServices, InMemoryEntitySpawner, SpawnedEntity};
pub use registry::HologramRegistry;
pub use storage::{
    ConfigStore, FileStorage, FileStore, InMemoryStorage, InMemoryStore, StorageProvider,
    StoreError, StoreValue,
};
