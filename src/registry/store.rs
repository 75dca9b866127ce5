use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::core::record::KEY_COLUMN;
use crate::merge::orchestrator::DatabaseConfig;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse registry: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Database '{0}' is listed more than once")]
    DuplicateDatabase(String),

    #[error("Database '{name}' not found in registry (available: {available})")]
    UnknownDatabase { name: String, available: String },
}

/// Registry version for compatibility checking
pub const REGISTRY_VERSION: &str = "1.0.0";

fn default_key() -> String {
    KEY_COLUMN.to_string()
}

/// One database as described in the registry file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Relative paths resolve against the data directory
    pub path: PathBuf,

    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_columns: Vec<String>,
}

impl DatabaseEntry {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn resolve_path(&self, data_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            data_dir.join(&self.path)
        }
    }

    #[must_use]
    pub fn to_config(&self, data_dir: &Path) -> DatabaseConfig {
        DatabaseConfig::new(&self.name, self.resolve_path(data_dir))
            .with_key(&self.key)
            .with_required_columns(self.required_columns.clone())
    }
}

/// Serializable registry format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryData {
    pub version: String,
    pub databases: Vec<DatabaseEntry>,
}

/// Ordered set of known databases
#[derive(Debug, Default)]
pub struct DatabaseRegistry {
    entries: Vec<DatabaseEntry>,

    /// Index: database name -> index in entries vec
    name_to_index: HashMap<String, usize>,
}

impl DatabaseRegistry {
    /// Load the embedded default registry
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ParseError` if the embedded JSON is invalid.
    pub fn load_embedded() -> Result<Self, RegistryError> {
        // Embedded at compile time, validated by build.rs
        const EMBEDDED_REGISTRY: &str = include_str!("../../registry/databases.json");
        Self::from_json(EMBEDDED_REGISTRY)
    }

    /// Load registry from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ReadError` if the file cannot be read, or any
    /// error from [`Self::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse registry from JSON string
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ParseError` for invalid JSON, or
    /// `RegistryError::DuplicateDatabase` if a name appears twice.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let data: RegistryData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != REGISTRY_VERSION {
            warn!(
                expected = REGISTRY_VERSION,
                found = %data.version,
                "Registry version mismatch"
            );
        }

        let mut registry = Self::default();
        for entry in data.databases {
            registry.add_entry(entry)?;
        }
        Ok(registry)
    }

    /// Add a database at the end of the registry
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateDatabase` if the name is taken.
    pub fn add_entry(&mut self, entry: DatabaseEntry) -> Result<(), RegistryError> {
        if self.name_to_index.contains_key(&entry.name) {
            return Err(RegistryError::DuplicateDatabase(entry.name));
        }
        self.name_to_index
            .insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.name_to_index.get(name).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a database and resolve it against `data_dir`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownDatabase` listing the known names.
    pub fn resolve(&self, name: &str, data_dir: &Path) -> Result<DatabaseConfig, RegistryError> {
        self.get(name)
            .map(|entry| entry.to_config(data_dir))
            .ok_or_else(|| RegistryError::UnknownDatabase {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Resolve every database, in registry order
    #[must_use]
    pub fn resolve_all(&self, data_dir: &Path) -> Vec<DatabaseConfig> {
        self.entries
            .iter()
            .map(|entry| entry.to_config(data_dir))
            .collect()
    }

    /// Export registry to JSON
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        let data = RegistryData {
            version: REGISTRY_VERSION.to_string(),
            databases: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }
}
