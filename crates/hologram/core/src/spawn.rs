//! Contract between holograms and the host's entity system.
use std::fmt;

use crate::line::HologramLine;
use crate::location::Location;

/// Opaque identifier of an entity created by an [`EntitySpawner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// The host could not create the entity backing a hologram line.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("world `{0}` is not loaded")]
    WorldUnavailable(String),

    #[error("line `{raw}` cannot be displayed: {reason}")]
    InvalidLine { raw: String, reason: String },

    #[error("host refused to spawn entity for `{raw}`")]
    Refused { raw: String },
}

/// Host entity API used to show hologram lines in a world.
///
/// Implementations own the actual entities; holograms only keep the handles.
pub trait EntitySpawner: Send + Sync {
    /// Create the entity that displays `line` at `location`.
    fn spawn(&self, location: &Location, line: &HologramLine) -> Result<EntityHandle, SpawnError>;

    /// Move an existing entity.
    fn move_to(&self, handle: EntityHandle, location: &Location);

    /// Push new content for an existing entity (animated frames, edited text).
    fn update(&self, handle: EntityHandle, line: &HologramLine);

    /// Remove an entity. Unknown handles are ignored.
    fn despawn(&self, handle: EntityHandle);
}
