//! Hologram data model and host-facing contracts.
//!
//! `hologram-core` defines what a hologram is (a named [`Location`] with an
//! ordered stack of [`HologramLine`]s) and the traits a host implements so the
//! model can be shown in a world:
//! - [`EntitySpawner`] creates and removes the visual entities of each line
//! - [`LocationCodec`] turns a location into a storable string and back
//! - [`LineParser`] turns a raw line string into a typed line
//!
//! Nothing here touches storage; persistence lives in `hologram-runtime`.
pub mod hologram;
pub mod line;
pub mod location;
pub mod spawn;

pub use hologram::{Hologram, HologramError, normalize_name};
pub use line::{
    Animation, AnimationError, DefaultLineParser, HologramLine, ITEM_LINE_HEIGHT, LineId,
    LineKind, LineParser, TEXT_LINE_HEIGHT, translate_colors,
};
pub use location::{CsvLocationCodec, Location, LocationCodec, LocationError, Position};
pub use spawn::{EntityHandle, EntitySpawner, SpawnError};
