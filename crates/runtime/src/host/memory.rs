//! In-memory entity spawner for tests, tools and headless runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use hologram_core::{EntityHandle, EntitySpawner, HologramLine, Location, SpawnError};

/// Snapshot of one entity held by [`InMemoryEntitySpawner`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnedEntity {
    pub handle: EntityHandle,
    pub location: Location,
    pub content: String,
}

type RefusePredicate = Box<dyn Fn(&HologramLine) -> bool + Send + Sync>;

/// Keeps spawned entities in a map instead of a world.
///
/// Can be told to refuse certain lines so spawn failures can be exercised.
pub struct InMemoryEntitySpawner {
    next_handle: AtomicU64,
    entities: RwLock<BTreeMap<EntityHandle, SpawnedEntity>>,
    refuse: Option<RefusePredicate>,
}

impl InMemoryEntitySpawner {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            entities: RwLock::new(BTreeMap::new()),
            refuse: None,
        }
    }

    /// Spawner that fails for every line matching `predicate`.
    pub fn refusing(predicate: impl Fn(&HologramLine) -> bool + Send + Sync + 'static) -> Self {
        Self {
            refuse: Some(Box::new(predicate)),
            ..Self::new()
        }
    }

    /// Live entities ordered by handle (spawn order).
    pub fn entities(&self) -> Vec<SpawnedEntity> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn get(&self, handle: EntityHandle) -> Option<SpawnedEntity> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
    }
}

impl Default for InMemoryEntitySpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitySpawner for InMemoryEntitySpawner {
    fn spawn(&self, location: &Location, line: &HologramLine) -> Result<EntityHandle, SpawnError> {
        if self.refuse.as_ref().is_some_and(|refuse| refuse(line)) {
            return Err(SpawnError::Refused {
                raw: line.raw().to_string(),
            });
        }

        let handle = EntityHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                handle,
                SpawnedEntity {
                    handle,
                    location: location.clone(),
                    content: line.rendered().to_string(),
                },
            );
        Ok(handle)
    }

    fn move_to(&self, handle: EntityHandle, location: &Location) {
        if let Some(entity) = self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&handle)
        {
            entity.location = location.clone();
        }
    }

    fn update(&self, handle: EntityHandle, line: &HologramLine) {
        if let Some(entity) = self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&handle)
        {
            entity.content = line.rendered().to_string();
        }
    }

    fn despawn(&self, handle: EntityHandle) {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
    }
}
