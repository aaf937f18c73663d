//! The authoritative set of active holograms and its persistence.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use hologram_core::{
    Hologram, HologramError, HologramLine, LineId, LocationCodec, normalize_name,
};
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::host::HostServices;
use crate::storage::{ConfigStore, StorageProvider, StoreValue, keys};

/// Raw values of one persisted hologram, read before any decoding happens.
struct StoredRecord {
    name: String,
    location: Option<StoreValue>,
    lines: Option<StoreValue>,
}

/// Owns every active hologram and mirrors them into the configured store.
///
/// The registry is a single owned context object: create it when the host
/// enables the plugin, call [`load`](Self::load) (or [`reload`](Self::reload)),
/// and call [`shutdown`](Self::shutdown) on disable. All methods expect to run
/// on the host's logic thread.
///
/// Names are case-insensitive everywhere. Holograms are keyed by their
/// lower-cased name and persisted under their display name, so `Welcome` is
/// stored as `holograms.Welcome.*` and found by `get_hologram("welcome")`.
/// Reads fall back to a record stored under a different case of the name;
/// saves and deletes purge every case variant of it.
///
/// Edits to a hologram are not persisted automatically; call
/// [`save_hologram`](Self::save_hologram) after changing it.
pub struct HologramRegistry {
    services: HostServices,
    config: RegistryConfig,
    store: Option<Box<dyn ConfigStore>>,
    active: BTreeMap<String, Hologram>,
    tracked: HashSet<LineId>,
}

impl HologramRegistry {
    /// Create a registry and open its store. Nothing is loaded yet.
    pub fn new(services: HostServices, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self {
            services,
            config,
            store: None,
            active: BTreeMap::new(),
            tracked: HashSet::new(),
        };
        registry.reload_configuration()?;
        Ok(registry)
    }

    pub fn services(&self) -> &HostServices {
        &self.services
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Despawn everything, re-open the store and load it again.
    pub fn reload(&mut self) -> Result<()> {
        self.clear();
        self.reload_configuration()?;
        self.load()
    }

    /// Load every persisted hologram into the active set.
    ///
    /// Records that cannot be restored (bad location, unparsable line, spawn
    /// failure) are logged and skipped; the rest still load. Only storage
    /// failures are returned.
    pub fn load(&mut self) -> Result<()> {
        let Some(records) = self.read_records()? else {
            info!(
                "Store '{}' has no '{}' list defined, no holograms loaded",
                self.config.store_name,
                keys::HOLOGRAMS
            );
            return Ok(());
        };

        let total = records.len();
        let mut loaded = 0;
        for record in records {
            let Some(hologram) = self.restore(record) else {
                continue;
            };

            info!(
                "Loaded hologram \"{}\" with {} lines",
                hologram.name(),
                hologram.lines().len()
            );
            if let Some(mut replaced) = self.add_active_hologram(hologram) {
                debug!("Replaced already active hologram \"{}\"", replaced.name());
                replaced.despawn(self.services.spawner());
            }
            loaded += 1;
        }

        info!("Loaded {}/{} holograms", loaded, total);
        Ok(())
    }

    /// Persist the active hologram `name` and rewrite the name list.
    pub fn save_hologram(&mut self, name: &str) -> Result<()> {
        let names = self.persisted_names();
        let hologram = self
            .active
            .get(&normalize_name(name))
            .ok_or_else(|| RegistryError::UnknownHologram(name.to_string()))?;

        let store = acquire_store(
            &mut self.store,
            self.services.storage.as_ref(),
            &self.config.store_name,
        )?;
        write_record(store, self.services.codec(), hologram)?;
        store.set(keys::HOLOGRAMS, names.into())?;

        debug!("Saved hologram \"{}\"", hologram.name());
        Ok(())
    }

    /// Persist every active hologram and rewrite the name list.
    pub fn save_all(&mut self) -> Result<()> {
        let names = self.persisted_names();
        let store = acquire_store(
            &mut self.store,
            self.services.storage.as_ref(),
            &self.config.store_name,
        )?;
        for hologram in self.active.values() {
            write_record(store, self.services.codec(), hologram)?;
        }
        store.set(keys::HOLOGRAMS, names.into())?;

        debug!("Saved {} holograms", self.active.len());
        Ok(())
    }

    /// Despawn and unregister `name`, then purge its persisted record.
    ///
    /// Returns the removed hologram if it was active. A name that is not
    /// active still has its keys purged, in any case, and the name list
    /// rewritten.
    pub fn delete_hologram(&mut self, name: &str) -> Result<Option<Hologram>> {
        let removed = self.remove_active_hologram(name).map(|mut hologram| {
            hologram.despawn(self.services.spawner());
            hologram
        });
        let names = self.persisted_names();
        let store = acquire_store(
            &mut self.store,
            self.services.storage.as_ref(),
            &self.config.store_name,
        )?;
        let purged = purge_record(store, name, None)?;
        store.set(keys::HOLOGRAMS, names.into())?;

        debug!("Deleted hologram \"{}\" ({} stored keys)", name, purged);
        Ok(removed)
    }

    /// Case-insensitive lookup.
    pub fn get_hologram(&self, name: &str) -> Option<&Hologram> {
        self.active.get(&normalize_name(name))
    }

    pub fn get_hologram_mut(&mut self, name: &str) -> Option<&mut Hologram> {
        self.active.get_mut(&normalize_name(name))
    }

    /// Live view of the active set, keyed by lower-cased name.
    pub fn active_holograms(&self) -> &BTreeMap<String, Hologram> {
        &self.active
    }

    /// Mutable live view of the active set.
    ///
    /// Prefer [`add_active_hologram`](Self::add_active_hologram) and
    /// [`remove_active_hologram`](Self::remove_active_hologram); entries
    /// inserted here must be keyed by [`Hologram::key`].
    pub fn active_holograms_mut(&mut self) -> &mut BTreeMap<String, Hologram> {
        &mut self.active
    }

    /// Register `hologram` without persisting it.
    ///
    /// Returns the hologram previously registered under the same name.
    pub fn add_active_hologram(&mut self, hologram: Hologram) -> Option<Hologram> {
        self.active.insert(hologram.key(), hologram)
    }

    /// Unregister `name` without touching storage or despawning it.
    pub fn remove_active_hologram(&mut self, name: &str) -> Option<Hologram> {
        self.active.remove(&normalize_name(name))
    }

    /// Start tracking an updating line. Static lines are ignored.
    pub fn track_line(&mut self, line: &HologramLine) {
        if !line.is_updating() {
            debug!("Ignoring track request for static {}", line.id());
            return;
        }
        self.tracked.insert(line.id());
    }

    /// Stop tracking `line`; returns whether it was tracked.
    pub fn untrack_line(&mut self, line: &HologramLine) -> bool {
        self.tracked.remove(&line.id())
    }

    /// Lines an update driver should refresh.
    pub fn tracked_lines(&self) -> &HashSet<LineId> {
        &self.tracked
    }

    /// Despawn and drop every active hologram. Storage and tracked lines are
    /// left alone.
    pub fn clear(&mut self) {
        let spawner = self.services.spawner();
        for hologram in self.active.values_mut() {
            hologram.despawn(spawner);
        }
        self.active.clear();
    }

    /// Clear the active set and release the store handle.
    ///
    /// The next [`load`](Self::load) re-acquires the store.
    pub fn shutdown(&mut self) {
        self.clear();
        self.store = None;
        debug!("Registry for store '{}' shut down", self.config.store_name);
    }

    fn reload_configuration(&mut self) -> Result<()> {
        self.store = Some(self.services.storage.open(&self.config.store_name)?);
        Ok(())
    }

    /// Names written to the `holograms` list, in active-set order.
    fn persisted_names(&self) -> Vec<String> {
        self.active
            .values()
            .map(|hologram| hologram.name().to_string())
            .collect()
    }

    fn read_records(&mut self) -> Result<Option<Vec<StoredRecord>>> {
        let store = acquire_store(
            &mut self.store,
            self.services.storage.as_ref(),
            &self.config.store_name,
        )?;

        let Some(names) = store.get_list(keys::HOLOGRAMS)? else {
            return Ok(None);
        };

        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let stored = resolve_record_name(store, &name)?;
            records.push(StoredRecord {
                location: store.get(&keys::location(&stored))?,
                lines: store.get(&keys::lines(&stored))?,
                name,
            });
        }
        Ok(Some(records))
    }

    /// Rebuild and spawn one hologram, or log why it was skipped.
    fn restore(&self, record: StoredRecord) -> Option<Hologram> {
        let StoredRecord {
            name,
            location,
            lines,
        } = record;

        let location = match location {
            Some(StoreValue::Text(encoded)) => match self.services.codec().decode(&encoded) {
                Ok(location) => location,
                Err(err) => {
                    warn!("Hologram \"{}\" has an invalid location: {}", name, err);
                    return None;
                }
            },
            Some(StoreValue::List(_)) => {
                warn!("Hologram \"{}\" has an invalid location: not a string", name);
                return None;
            }
            None => {
                warn!("Hologram \"{}\" has no location", name);
                return None;
            }
        };

        let raw_lines = match lines {
            Some(StoreValue::List(lines)) => lines,
            Some(StoreValue::Text(_)) => {
                warn!("Hologram \"{}\" has invalid lines: not a list", name);
                return None;
            }
            None => {
                warn!("Hologram \"{}\" has no lines", name);
                return None;
            }
        };

        let spawner = self.services.spawner();
        let mut hologram = Hologram::new(name, location);
        for raw in &raw_lines {
            let attached = self
                .services
                .parser()
                .parse(&hologram, raw)
                .map_err(HologramError::from)
                .and_then(|line| hologram.add_line(line, spawner));
            if let Err(err) = attached {
                warn!("Failed to spawn hologram \"{}\": {}", hologram.name(), err);
                return None;
            }
        }

        if let Err(err) = hologram.spawn(spawner) {
            warn!("Failed to spawn hologram \"{}\": {}", hologram.name(), err);
            return None;
        }

        Some(hologram)
    }
}

/// Return the open store, opening it first if the handle was released.
fn acquire_store<'a>(
    slot: &'a mut Option<Box<dyn ConfigStore>>,
    provider: &dyn StorageProvider,
    name: &str,
) -> Result<&'a dyn ConfigStore> {
    let store = match slot.take() {
        Some(store) => store,
        None => provider.open(name)?,
    };
    Ok(&**slot.insert(store))
}

/// Display names under which records matching `name` are stored.
fn stored_record_names(store: &dyn ConfigStore, name: &str) -> Result<BTreeSet<String>> {
    let wanted = normalize_name(name);
    Ok(store
        .keys()?
        .iter()
        .filter_map(|key| keys::record_name(key))
        .filter(|stored| normalize_name(stored) == wanted)
        .map(str::to_string)
        .collect())
}

/// Name under which the record for `name` is actually stored.
///
/// An exact match wins; otherwise the first case variant found is used.
fn resolve_record_name(store: &dyn ConfigStore, name: &str) -> Result<String> {
    let stored = stored_record_names(store, name)?;
    if stored.contains(name) {
        return Ok(name.to_string());
    }
    Ok(stored
        .into_iter()
        .next()
        .unwrap_or_else(|| name.to_string()))
}

/// Delete every stored case variant of `name` except `keep`.
///
/// Returns how many keys were removed.
fn purge_record(store: &dyn ConfigStore, name: &str, keep: Option<&str>) -> Result<usize> {
    let mut purged = 0;
    for stored in stored_record_names(store, name)? {
        if keep == Some(stored.as_str()) {
            continue;
        }
        for key in [keys::location(&stored), keys::lines(&stored)] {
            if store.get(&key)?.is_some() {
                store.delete(&key)?;
                purged += 1;
            }
        }
    }
    Ok(purged)
}

/// Write the `location` and `lines` keys of one hologram, replacing any
/// record stored under another case of its name.
fn write_record(
    store: &dyn ConfigStore,
    codec: &dyn LocationCodec,
    hologram: &Hologram,
) -> Result<()> {
    purge_record(store, hologram.name(), Some(hologram.name()))?;
    let lines: Vec<String> = hologram.raw_lines().map(str::to_string).collect();
    store.set(
        &keys::location(hologram.name()),
        codec.encode(hologram.location()).into(),
    )?;
    store.set(&keys::lines(hologram.name()), lines.into())?;
    Ok(())
}
