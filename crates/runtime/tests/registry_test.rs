use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};

use hologram_core::{HologramLine, LineId, LineParser, Location, Position};
use hologram_runtime::storage::keys;
use hologram_runtime::{
    ConfigStore, FileStorage, HologramRegistry, HostServices, InMemoryEntitySpawner,
    InMemoryStorage, RegistryConfig, RegistryError, StorageProvider, StoreError, StoreValue,
};
use tempfile::TempDir;
use tracing::Level;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};

const STORE: &str = "holograms";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Layer that keeps every event's level and message for later assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    fn contains(&self, level: Level, needle: &str) -> bool {
        self.0
            .lock()
            .unwrap()
            .iter()
            .any(|(logged, message)| *logged == level && message.contains(needle))
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CapturedLogs {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

/// Run `f` with events on this thread routed into a fresh [`CapturedLogs`].
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    let output = tracing::subscriber::with_default(subscriber, f);
    (output, logs)
}

fn keys_of(storage: &InMemoryStorage) -> Vec<String> {
    let mut keys = storage.open(STORE).unwrap().keys().unwrap();
    keys.sort();
    keys
}

fn config() -> RegistryConfig {
    RegistryConfig::new("unused", STORE)
}

fn registry_with(
    storage: Arc<dyn StorageProvider>,
    spawner: Arc<InMemoryEntitySpawner>,
) -> HologramRegistry {
    init_logging();
    HologramRegistry::new(HostServices::with_defaults(storage, spawner), config())
        .expect("registry should open its store")
}

fn seed(storage: &InMemoryStorage, entries: Vec<(&str, StoreValue)>) {
    let store = storage.open(STORE).unwrap();
    for (key, value) in entries {
        store.set(key, value).unwrap();
    }
}

fn list(items: &[&str]) -> StoreValue {
    StoreValue::List(items.iter().map(|item| item.to_string()).collect())
}

fn raw_lines(registry: &HologramRegistry, name: &str) -> Vec<String> {
    registry
        .get_hologram(name)
        .expect("hologram should be active")
        .raw_lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn loads_welcome_hologram() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Welcome"])),
            ("holograms.Welcome.location", "world,0,64,0,0,0".into()),
            ("holograms.Welcome.lines", list(&["Hi there", "Second line"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage, spawner.clone());

    registry.load().unwrap();

    let hologram = registry.get_hologram("welcome").expect("lookup ignores case");
    assert_eq!(hologram.name(), "Welcome");
    assert!(hologram.is_spawned());
    assert_eq!(hologram.location().world, "world");
    assert_eq!(hologram.location().position, Position::new(0.0, 64.0, 0.0));
    assert_eq!(raw_lines(&registry, "WELCOME"), ["Hi there", "Second line"]);

    let entities = spawner.entities();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].content, "Hi there");
    assert_eq!(entities[0].location.position.y, 64.0);
    assert_eq!(entities[1].content, "Second line");
    assert_eq!(entities[1].location.position.y, 63.75);
}

#[test]
fn missing_name_list_loads_nothing() {
    let storage = Arc::new(InMemoryStorage::new());
    let mut registry = registry_with(storage, Arc::new(InMemoryEntitySpawner::new()));

    let (result, logs) = capture_logs(|| registry.load());
    result.unwrap();
    assert!(registry.active_holograms().is_empty());
    assert!(logs.contains(Level::INFO, "no 'holograms' list defined"));
}

#[test]
fn invalid_location_skips_only_that_hologram() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Broken", "Good"])),
            ("holograms.Broken.location", "not a location".into()),
            ("holograms.Broken.lines", list(&["never shown"])),
            ("holograms.Good.location", "world,10,70,-5".into()),
            ("holograms.Good.lines", list(&["shown"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage, spawner.clone());

    let (result, logs) = capture_logs(|| registry.load());
    result.unwrap();

    assert_eq!(registry.active_holograms().len(), 1);
    assert!(registry.get_hologram("broken").is_none());
    assert!(registry.get_hologram("good").is_some());
    assert_eq!(spawner.live_count(), 1);
    assert!(logs.contains(Level::WARN, "\"Broken\" has an invalid location"));
    assert!(logs.contains(Level::INFO, "Loaded 1/2 holograms"));
}

#[test]
fn malformed_records_are_skipped() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["NoLines", "TextLines", "ListLocation", "BadItem", "Ok"])),
            ("holograms.NoLines.location", "world,0,0,0".into()),
            ("holograms.TextLines.location", "world,0,0,0".into()),
            ("holograms.TextLines.lines", "single string".into()),
            ("holograms.ListLocation.location", list(&["world", "0"])),
            ("holograms.ListLocation.lines", list(&["x"])),
            ("holograms.BadItem.location", "world,0,0,0".into()),
            ("holograms.BadItem.lines", list(&["fine", "item:"])),
            ("holograms.Ok.location", "world,0,0,0".into()),
            ("holograms.Ok.lines", list(&[])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage, spawner.clone());

    registry.load().unwrap();

    let names: Vec<&str> = registry.active_holograms().keys().map(String::as_str).collect();
    assert_eq!(names, ["ok"]);
    assert_eq!(spawner.live_count(), 0);
}

#[test]
fn spawn_failure_skips_only_that_hologram() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["First", "Cursed", "Last"])),
            ("holograms.First.location", "world,0,0,0".into()),
            ("holograms.First.lines", list(&["one"])),
            ("holograms.Cursed.location", "world,0,0,0".into()),
            ("holograms.Cursed.lines", list(&["ok", "&4cursed", "after"])),
            ("holograms.Last.location", "world,0,0,0".into()),
            ("holograms.Last.lines", list(&["two", "three"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::refusing(|line: &HologramLine| {
        line.raw().contains("cursed")
    }));
    let mut registry = registry_with(storage, spawner.clone());

    registry.load().unwrap();

    assert!(registry.get_hologram("first").is_some());
    assert!(registry.get_hologram("cursed").is_none());
    assert!(registry.get_hologram("last").is_some());
    assert_eq!(spawner.live_count(), 3);
}

#[test]
fn save_then_load_round_trips() {
    let storage = Arc::new(InMemoryStorage::new());
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage.clone(), spawner.clone());

    let location =
        Location::new("lobby", Position::new(12.5, 80.0, -3.25)).with_rotation(45.0, -10.0);
    let mut hologram = hologram_core::Hologram::new("Rules", location.clone());
    for raw in ["&6Server Rules", "item:book", "animated:20:&aBe nice||&bHave fun"] {
        let line = registry
            .services()
            .parser()
            .parse(&hologram, raw)
            .unwrap();
        hologram.add_line(line, &*spawner).unwrap();
    }
    hologram.spawn(&*spawner).unwrap();
    registry.add_active_hologram(hologram);
    registry.save_hologram("rules").unwrap();

    let fresh_spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut fresh = registry_with(storage, fresh_spawner.clone());
    fresh.load().unwrap();

    let loaded = fresh.get_hologram("RULES").expect("saved hologram loads");
    assert_eq!(loaded.name(), "Rules");
    assert_eq!(loaded.location(), &location);
    assert_eq!(
        raw_lines(&fresh, "rules"),
        ["&6Server Rules", "item:book", "animated:20:&aBe nice||&bHave fun"]
    );
    assert_eq!(loaded.updating_lines().count(), 1);
    assert_eq!(fresh_spawner.live_count(), 3);
}

#[test]
fn name_list_follows_active_set() {
    let storage = Arc::new(InMemoryStorage::new());
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage.clone(), spawner);

    for name in ["beta", "Alpha", "Gamma"] {
        registry.add_active_hologram(hologram_core::Hologram::new(
            name,
            Location::new("world", Position::ORIGIN),
        ));
    }
    registry.save_hologram("alpha").unwrap();

    let store = storage.open(STORE).unwrap();
    assert_eq!(
        store.get_list(keys::HOLOGRAMS).unwrap(),
        Some(vec!["Alpha".to_string(), "beta".to_string(), "Gamma".to_string()])
    );
    // Only the saved hologram has a record.
    assert!(store.get(&keys::location("beta")).unwrap().is_none());

    registry.delete_hologram("BETA").unwrap();
    assert_eq!(
        store.get_list(keys::HOLOGRAMS).unwrap(),
        Some(vec!["Alpha".to_string(), "Gamma".to_string()])
    );
}

#[test]
fn delete_removes_entity_and_record() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Doomed", "Kept"])),
            ("holograms.Doomed.location", "world,1,2,3".into()),
            ("holograms.Doomed.lines", list(&["bye"])),
            ("holograms.Kept.location", "world,4,5,6".into()),
            ("holograms.Kept.lines", list(&["hi"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage.clone(), spawner.clone());
    registry.load().unwrap();
    assert_eq!(spawner.live_count(), 2);

    let removed = registry.delete_hologram("doomed").unwrap().expect("was active");
    assert_eq!(removed.name(), "Doomed");
    assert!(!removed.is_spawned());
    assert!(registry.get_hologram("Doomed").is_none());
    assert_eq!(spawner.live_count(), 1);

    let store = storage.open(STORE).unwrap();
    assert!(store.get(&keys::location("Doomed")).unwrap().is_none());
    assert!(store.get(&keys::lines("Doomed")).unwrap().is_none());

    registry.reload().unwrap();
    assert!(registry.get_hologram("doomed").is_none());
    assert!(registry.get_hologram("kept").is_some());
    assert_eq!(spawner.live_count(), 1);
}

#[test]
fn delete_unknown_name_is_safe() {
    let storage = Arc::new(InMemoryStorage::new());
    let mut registry = registry_with(storage.clone(), Arc::new(InMemoryEntitySpawner::new()));

    assert!(registry.delete_hologram("nobody").unwrap().is_none());
    let store = storage.open(STORE).unwrap();
    assert_eq!(store.get_list(keys::HOLOGRAMS).unwrap(), Some(vec![]));
}

#[test]
fn delete_purges_skipped_record_in_any_case() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Welcome"])),
            ("holograms.Welcome.location", "nowhere".into()),
            ("holograms.Welcome.lines", list(&["hi"])),
        ],
    );
    let mut registry = registry_with(storage.clone(), Arc::new(InMemoryEntitySpawner::new()));
    registry.load().unwrap();
    assert!(registry.get_hologram("welcome").is_none());

    assert!(registry.delete_hologram("welcome").unwrap().is_none());
    assert_eq!(keys_of(&storage), ["holograms"]);
}

#[test]
fn renaming_by_case_replaces_stored_record() {
    let storage = Arc::new(InMemoryStorage::new());
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage.clone(), spawner);
    let location = Location::new("world", Position::ORIGIN);

    registry.add_active_hologram(hologram_core::Hologram::new("Welcome", location.clone()));
    registry.save_hologram("welcome").unwrap();
    registry.add_active_hologram(hologram_core::Hologram::new("WELCOME", location));
    registry.save_hologram("welcome").unwrap();

    assert_eq!(
        keys_of(&storage),
        ["holograms", "holograms.WELCOME.lines", "holograms.WELCOME.location"]
    );
    let store = storage.open(STORE).unwrap();
    assert_eq!(
        store.get_list(keys::HOLOGRAMS).unwrap(),
        Some(vec!["WELCOME".to_string()])
    );
}

#[test]
fn load_finds_record_stored_under_other_case() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["welcome"])),
            ("holograms.Welcome.location", "world,0,64,0".into()),
            ("holograms.Welcome.lines", list(&["hi"])),
        ],
    );
    let mut registry = registry_with(storage, Arc::new(InMemoryEntitySpawner::new()));
    registry.load().unwrap();

    assert_eq!(registry.get_hologram("WELCOME").unwrap().name(), "welcome");
    assert_eq!(raw_lines(&registry, "welcome"), ["hi"]);
}

#[test]
fn clear_keeps_tracked_lines_and_storage() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Anim"])),
            ("holograms.Anim.location", "world,0,0,0".into()),
            ("holograms.Anim.lines", list(&["animated:5:a||b", "static"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage, spawner.clone());
    registry.load().unwrap();

    let hologram = registry.remove_active_hologram("anim").unwrap();
    let updating: Vec<LineId> = hologram.updating_lines().map(HologramLine::id).collect();
    assert_eq!(updating.len(), 1);
    for line in hologram.updating_lines() {
        registry.track_line(line);
    }
    registry.add_active_hologram(hologram);

    registry.clear();
    assert!(registry.active_holograms().is_empty());
    assert_eq!(spawner.live_count(), 0);
    assert!(registry.tracked_lines().contains(&updating[0]));

    registry.load().unwrap();
    assert!(registry.get_hologram("anim").is_some());
}

#[test]
fn reload_picks_up_external_changes() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Old"])),
            ("holograms.Old.location", "world,0,0,0".into()),
            ("holograms.Old.lines", list(&["old"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage.clone(), spawner.clone());
    registry.load().unwrap();

    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["New"])),
            ("holograms.New.location", "world,0,0,0".into()),
            ("holograms.New.lines", list(&["new"])),
        ],
    );
    registry.reload().unwrap();

    assert!(registry.get_hologram("old").is_none());
    assert!(registry.get_hologram("new").is_some());
    let entities = spawner.entities();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].content, "new");
}

#[test]
fn load_twice_does_not_leak_entities() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Once"])),
            ("holograms.Once.location", "world,0,0,0".into()),
            ("holograms.Once.lines", list(&["a", "b"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage, spawner.clone());

    registry.load().unwrap();
    registry.load().unwrap();

    assert_eq!(registry.active_holograms().len(), 1);
    assert_eq!(spawner.live_count(), 2);
}

#[test]
fn shutdown_releases_store_until_next_load() {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![
            (keys::HOLOGRAMS, list(&["Persistent"])),
            ("holograms.Persistent.location", "world,0,0,0".into()),
            ("holograms.Persistent.lines", list(&["still here"])),
        ],
    );
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage, spawner.clone());
    registry.load().unwrap();

    registry.shutdown();
    assert!(registry.active_holograms().is_empty());
    assert_eq!(spawner.live_count(), 0);

    registry.load().unwrap();
    assert!(registry.get_hologram("persistent").is_some());
}

#[test]
fn file_storage_round_trip() {
    let temp_dir = TempDir::new().unwrap();

    {
        let storage = Arc::new(FileStorage::new(temp_dir.path()).unwrap());
        let spawner = Arc::new(InMemoryEntitySpawner::new());
        let mut registry = registry_with(storage, spawner.clone());

        let mut hologram = hologram_core::Hologram::new(
            "Spawn",
            Location::new("world", Position::new(0.5, 100.0, 0.5)),
        );
        hologram
            .add_line(HologramLine::text("&eWelcome!"), &*spawner)
            .unwrap();
        registry.add_active_hologram(hologram);
        registry.save_all().unwrap();
        registry.shutdown();
    }

    assert!(temp_dir.path().join("holograms.json").exists());

    let storage = Arc::new(FileStorage::new(temp_dir.path()).unwrap());
    let spawner = Arc::new(InMemoryEntitySpawner::new());
    let mut registry = registry_with(storage, spawner.clone());
    registry.load().unwrap();

    assert_eq!(raw_lines(&registry, "spawn"), ["&eWelcome!"]);
    assert_eq!(spawner.entities()[0].content, "§eWelcome!");
}

/// Provider whose store fails every read with an I/O error.
struct BrokenStorage;

struct BrokenStore;

impl StorageProvider for BrokenStorage {
    fn open(&self, _name: &str) -> hologram_runtime::storage::Result<Box<dyn ConfigStore>> {
        Ok(Box::new(BrokenStore))
    }
}

impl ConfigStore for BrokenStore {
    fn get(&self, _key: &str) -> hologram_runtime::storage::Result<Option<StoreValue>> {
        Err(io::Error::other("disk on fire").into())
    }

    fn set(&self, _key: &str, _value: StoreValue) -> hologram_runtime::storage::Result<()> {
        Err(io::Error::other("disk on fire").into())
    }

    fn delete(&self, _key: &str) -> hologram_runtime::storage::Result<()> {
        Err(io::Error::other("disk on fire").into())
    }

    fn keys(&self) -> hologram_runtime::storage::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[test]
fn storage_failures_propagate() {
    let mut registry = registry_with(
        Arc::new(BrokenStorage),
        Arc::new(InMemoryEntitySpawner::new()),
    );

    assert!(matches!(
        registry.load(),
        Err(RegistryError::Storage(StoreError::Io(_)))
    ));

    registry.add_active_hologram(hologram_core::Hologram::new(
        "Any",
        Location::new("world", Position::ORIGIN),
    ));
    assert!(matches!(
        registry.save_hologram("any"),
        Err(RegistryError::Storage(StoreError::Io(_)))
    ));
    assert!(matches!(
        registry.delete_hologram("any"),
        Err(RegistryError::Storage(StoreError::Io(_)))
    ));
}
