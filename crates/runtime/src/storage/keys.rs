//! Key layout of the hologram store.
//!
//! ```text
//! holograms                  -> list   names of all active holograms
//! holograms.<name>.location  -> text   encoded location
//! holograms.<name>.lines     -> list   raw line texts, top to bottom
//! ```

/// Key of the list holding every persisted hologram name.
pub const HOLOGRAMS: &str = "holograms";

pub fn location(name: &str) -> String {
    format!("{HOLOGRAMS}.{name}.location")
}

pub fn lines(name: &str) -> String {
    format!("{HOLOGRAMS}.{name}.lines")
}

/// Hologram name of a `location` or `lines` key; `None` for any other key.
pub fn record_name(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(HOLOGRAMS)?.strip_prefix('.')?;
    rest.strip_suffix(".location")
        .or_else(|| rest.strip_suffix(".lines"))
        .filter(|name| !name.is_empty())
}
