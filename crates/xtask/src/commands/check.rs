//! Load a store through the registry
//!
//! Runs the same load the host performs, against an in-memory spawner, so
//! records that would be skipped show up as warnings before a server start.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use hologram_core::normalize_name;
use hologram_runtime::storage::keys;
use hologram_runtime::{
    ConfigStore, FileStorage, HologramRegistry, HostServices, InMemoryEntitySpawner,
    StorageProvider,
};

use crate::utils;

/// Load a hologram store and report what survives
#[derive(Parser)]
pub struct Check {
    /// Store file to check (defaults to $HOLOGRAMS_DATA_DIR/$HOLOGRAMS_STORE.json)
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Exit with an error if any listed hologram fails to load
    #[arg(long)]
    strict: bool,
}

impl Check {
    pub fn execute(self) -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::INFO.into()),
            )
            .with_writer(std::io::stderr)
            .init();

        let path = utils::store_file(self.file);
        if !path.exists() {
            anyhow::bail!("Store file not found: {}", path.display());
        }
        let config = utils::config_for(&path)?;

        let storage = Arc::new(
            FileStorage::new(&config.data_dir)
                .with_context(|| format!("Failed to open {}", config.data_dir.display()))?,
        );
        let listed = storage
            .open(&config.store_name)?
            .get_list(keys::HOLOGRAMS)?
            .map_or(0, |names| distinct_names(&names));

        let spawner = Arc::new(InMemoryEntitySpawner::new());
        let mut registry =
            HologramRegistry::new(HostServices::with_defaults(storage, spawner.clone()), config)?;
        registry.load()?;

        let loaded = registry.active_holograms().len();
        println!(
            "{} {}/{} holograms, {} entities",
            style("Loaded:").bold().cyan(),
            loaded,
            listed,
            spawner.live_count()
        );

        if loaded < listed {
            let message = format!("{} holograms would be skipped", listed - loaded);
            if self.strict {
                anyhow::bail!(message);
            }
            println!("{}", style(message).yellow());
        } else {
            println!("{}", style("All listed holograms load").green());
        }

        registry.shutdown();
        Ok(())
    }
}

/// Number of holograms a name list describes; case variants count once.
fn distinct_names(names: &[String]) -> usize {
    names
        .iter()
        .map(|name| normalize_name(name))
        .collect::<BTreeSet<_>>()
        .len()
}
