//! Host collaborators injected into the registry.
//!
//! The registry never talks to a world directly. Everything host-specific is
//! reached through the trait objects bundled in [`HostServices`], mirroring
//! how a plugin receives its server handles on enable.
mod memory;

use std::sync::Arc;

use hologram_core::{
    CsvLocationCodec, DefaultLineParser, EntitySpawner, LineParser, LocationCodec,
};

use crate::storage::StorageProvider;

pub use memory::{InMemoryEntitySpawner, SpawnedEntity};

/// Bundle of host capabilities used by [`HologramRegistry`](crate::HologramRegistry).
#[derive(Clone)]
pub struct HostServices {
    pub(crate) storage: Arc<dyn StorageProvider>,
    pub(crate) spawner: Arc<dyn EntitySpawner>,
    pub(crate) codec: Arc<dyn LocationCodec>,
    pub(crate) parser: Arc<dyn LineParser>,
}

impl HostServices {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        spawner: Arc<dyn EntitySpawner>,
        codec: Arc<dyn LocationCodec>,
        parser: Arc<dyn LineParser>,
    ) -> Self {
        Self {
            storage,
            spawner,
            codec,
            parser,
        }
    }

    /// Services using the built-in location codec and line parser.
    pub fn with_defaults(
        storage: Arc<dyn StorageProvider>,
        spawner: Arc<dyn EntitySpawner>,
    ) -> Self {
        Self::new(
            storage,
            spawner,
            Arc::new(CsvLocationCodec),
            Arc::new(DefaultLineParser),
        )
    }

    pub fn spawner(&self) -> &dyn EntitySpawner {
        self.spawner.as_ref()
    }

    pub fn codec(&self) -> &dyn LocationCodec {
        self.codec.as_ref()
    }

    pub fn parser(&self) -> &dyn LineParser {
        self.parser.as_ref()
    }
}
