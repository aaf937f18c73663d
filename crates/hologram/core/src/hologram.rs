//! The hologram aggregate: a named location with a vertical stack of lines.
use crate::line::HologramLine;
use crate::location::Location;
use crate::spawn::{EntitySpawner, SpawnError};

/// Errors raised when editing a hologram's lines.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HologramError {
    #[error("line index {index} out of range for hologram with {len} lines")]
    LineIndex { index: usize, len: usize },

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

/// Lower-cased form of a hologram name, used wherever names are compared.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// A named, positioned, multi-line display.
///
/// The first line sits at [`Hologram::location`]; every following line is
/// placed below the previous one by that line's height. While the hologram is
/// spawned, every line owns exactly one host entity and edits are mirrored to
/// the [`EntitySpawner`] immediately.
///
/// Holograms are not `Clone`: their lines own live entities and unique ids.
#[derive(Debug)]
pub struct Hologram {
    name: String,
    location: Location,
    lines: Vec<HologramLine>,
    spawned: bool,
}

impl Hologram {
    /// Create an empty, not yet spawned hologram.
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            lines: Vec::new(),
            spawned: false,
        }
    }

    /// Display name, as typed by whoever created the hologram.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive identity of this hologram.
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn lines(&self) -> &[HologramLine] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&HologramLine> {
        self.lines.get(index)
    }

    /// Raw source of every line, top to bottom.
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(HologramLine::raw)
    }

    pub fn updating_lines(&self) -> impl Iterator<Item = &HologramLine> + '_ {
        self.lines.iter().filter(|line| line.is_updating())
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    /// Where the line at `index` is displayed.
    pub fn line_location(&self, index: usize) -> Location {
        let offset: f64 = self.lines.iter().take(index).map(HologramLine::height).sum();
        self.location.below(offset)
    }

    /// Spawn one entity per line.
    ///
    /// On failure every entity spawned by this call is removed again and the
    /// hologram stays despawned.
    pub fn spawn(&mut self, spawner: &dyn EntitySpawner) -> Result<(), SpawnError> {
        if self.spawned {
            return Ok(());
        }

        let mut offset = 0.0;
        for index in 0..self.lines.len() {
            let location = self.location.below(offset);
            match spawner.spawn(&location, &self.lines[index]) {
                Ok(handle) => self.lines[index].entity = Some(handle),
                Err(err) => {
                    self.remove_entities(spawner);
                    return Err(err);
                }
            }
            offset += self.lines[index].height();
        }

        self.spawned = true;
        Ok(())
    }

    /// Remove every line entity from the world.
    pub fn despawn(&mut self, spawner: &dyn EntitySpawner) {
        self.remove_entities(spawner);
        self.spawned = false;
    }

    pub fn add_line(
        &mut self,
        line: HologramLine,
        spawner: &dyn EntitySpawner,
    ) -> Result<(), HologramError> {
        self.insert_line(self.lines.len(), line, spawner)
    }

    /// Insert `line` so that it becomes the line at `index`.
    pub fn insert_line(
        &mut self,
        index: usize,
        mut line: HologramLine,
        spawner: &dyn EntitySpawner,
    ) -> Result<(), HologramError> {
        if index > self.lines.len() {
            return Err(HologramError::LineIndex {
                index,
                len: self.lines.len(),
            });
        }

        if self.spawned {
            line.entity = Some(spawner.spawn(&self.line_location(index), &line)?);
        }
        self.lines.insert(index, line);
        self.relayout(index + 1, spawner);
        Ok(())
    }

    /// Replace the line at `index`, returning the previous one.
    pub fn set_line(
        &mut self,
        index: usize,
        mut line: HologramLine,
        spawner: &dyn EntitySpawner,
    ) -> Result<HologramLine, HologramError> {
        self.check_index(index)?;

        if self.spawned {
            line.entity = Some(spawner.spawn(&self.line_location(index), &line)?);
        }
        let mut previous = std::mem::replace(&mut self.lines[index], line);
        if let Some(handle) = previous.entity.take() {
            spawner.despawn(handle);
        }
        self.relayout(index + 1, spawner);
        Ok(previous)
    }

    pub fn remove_line(
        &mut self,
        index: usize,
        spawner: &dyn EntitySpawner,
    ) -> Result<HologramLine, HologramError> {
        self.check_index(index)?;

        let mut removed = self.lines.remove(index);
        if let Some(handle) = removed.entity.take() {
            spawner.despawn(handle);
        }
        self.relayout(index, spawner);
        Ok(removed)
    }

    /// Move the whole stack to `location`.
    pub fn teleport(&mut self, location: Location, spawner: &dyn EntitySpawner) {
        self.location = location;
        self.relayout(0, spawner);
    }

    /// Advance every animated line by one tick and push changed content.
    ///
    /// Returns how many lines switched frame.
    pub fn advance_updating_lines(&mut self, spawner: &dyn EntitySpawner) -> usize {
        let mut changed = 0;
        for line in self.lines.iter_mut() {
            if line.tick() {
                if let Some(handle) = line.entity {
                    spawner.update(handle, line);
                }
                changed += 1;
            }
        }
        changed
    }

    fn check_index(&self, index: usize) -> Result<(), HologramError> {
        if index >= self.lines.len() {
            return Err(HologramError::LineIndex {
                index,
                len: self.lines.len(),
            });
        }
        Ok(())
    }

    /// Move entities of lines `from..` to their stacked positions.
    fn relayout(&self, from: usize, spawner: &dyn EntitySpawner) {
        if !self.spawned {
            return;
        }

        let mut offset: f64 = self.lines.iter().take(from).map(HologramLine::height).sum();
        for line in &self.lines[from.min(self.lines.len())..] {
            if let Some(handle) = line.entity {
                spawner.move_to(handle, &self.location.below(offset));
            }
            offset += line.height();
        }
    }

    fn remove_entities(&mut self, spawner: &dyn EntitySpawner) {
        for line in self.lines.iter_mut() {
            if let Some(handle) = line.entity.take() {
                spawner.despawn(handle);
            }
        }
    }
}
