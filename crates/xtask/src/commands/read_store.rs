//! Read and inspect hologram store files
//!
//! Opens a JSON store and prints each hologram record listed in it.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::collections::BTreeMap;
use std::path::PathBuf;

use hologram_core::{CsvLocationCodec, LocationCodec};
use hologram_runtime::storage::keys;
use hologram_runtime::{ConfigStore, FileStore, StoreValue};

use crate::utils;

/// Read and inspect a hologram store file
#[derive(Parser)]
pub struct ReadStore {
    /// Store file to read (defaults to $HOLOGRAMS_DATA_DIR/$HOLOGRAMS_STORE.json)
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// One block per hologram listed in the name list
    Summary,
    /// Every key in the store as JSON
    Json,
}

impl ReadStore {
    pub fn execute(self) -> Result<()> {
        let path = utils::store_file(self.file);
        if !path.exists() {
            anyhow::bail!("Store file not found: {}", path.display());
        }

        let store = FileStore::open(&path)
            .with_context(|| format!("Failed to open store: {}", path.display()))?;

        println!("{} {}", style("Store File:").bold().cyan(), path.display());
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&store),
            OutputFormat::Json => print_json(&store),
        }
    }
}

fn print_summary(store: &dyn ConfigStore) -> Result<()> {
    let Some(names) = store.get_list(keys::HOLOGRAMS)? else {
        println!(
            "{}",
            style("No 'holograms' list defined - nothing would load").dim()
        );
        return Ok(());
    };

    println!(
        "{} {}",
        style("Holograms:").bold().yellow(),
        names.len()
    );
    println!();

    let codec = CsvLocationCodec;
    for name in &names {
        println!("{}", style(name).bold().green());

        match store.get(&keys::location(name))? {
            Some(StoreValue::Text(encoded)) => match codec.decode(&encoded) {
                Ok(location) => println!("  Location: {location}"),
                Err(err) => println!(
                    "  Location: {} {}",
                    style(&encoded).red(),
                    style(format!("({err})")).red()
                ),
            },
            Some(StoreValue::List(_)) => println!("  Location: {}", style("<not a string>").red()),
            None => println!("  Location: {}", style("<missing>").red()),
        }

        match store.get(&keys::lines(name))? {
            Some(StoreValue::List(lines)) => {
                println!("  Lines: {}", lines.len());
                for (index, line) in lines.iter().enumerate() {
                    println!("    {index:>2}: {line}");
                }
            }
            Some(StoreValue::Text(_)) => println!("  Lines: {}", style("<not a list>").red()),
            None => println!("  Lines: {}", style("<missing>").red()),
        }
        println!();
    }

    Ok(())
}

fn print_json(store: &dyn ConfigStore) -> Result<()> {
    let mut tree = BTreeMap::new();
    for key in store.keys()? {
        if let Some(value) = store.get(&key)? {
            tree.insert(key, value);
        }
    }

    let json = serde_json::to_string_pretty(&tree).context("Failed to serialize store")?;
    println!("{json}");
    Ok(())
}
