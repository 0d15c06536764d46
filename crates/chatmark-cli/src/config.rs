//! Catalog file loading.
//!
//! Catalogs are TOML: one array of templates per command, each template with
//! an id, its text, and optional placeholders. A placeholder's marker
//! defaults to `<id>`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use chatmark_core::{Placeholder, Template, TemplateCatalog};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogFile {
    #[serde(default)]
    pub commands: HashMap<String, Vec<TemplateEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub id: String,

    /// Template text with placeholder markers inline
    pub text: String,

    #[serde(default)]
    pub placeholders: Vec<PlaceholderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderEntry {
    pub id: String,

    /// Marker as it appears in the template text; defaults to `<id>`
    #[serde(default)]
    pub marker: Option<String>,

    #[serde(default)]
    pub multiline: bool,
}

impl CatalogFile {
    pub fn into_catalog(self) -> TemplateCatalog {
        let mut catalog = TemplateCatalog::new();
        for (command, entries) in self.commands {
            for entry in entries {
                let mut template = Template::new(entry.id, entry.text);
                for placeholder in entry.placeholders {
                    let marker = placeholder
                        .marker
                        .unwrap_or_else(|| format!("<{}>", placeholder.id));
                    template.placeholders.push(Placeholder {
                        id: placeholder.id,
                        marker,
                        multiline: placeholder.multiline,
                    });
                }
                catalog.upsert(command.clone(), template);
            }
        }
        catalog
    }
}

pub fn load_catalog(path: &Path) -> Result<TemplateCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {:?}", path))?;
    let file: CatalogFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {:?}", path))?;
    Ok(file.into_catalog())
}
