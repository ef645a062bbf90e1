//! Configuration management for quadwarp
//!
//! The config file is a TOML document that also carries the warper's saved
//! corners as a named group, so the whole document is kept around and
//! written back with both parts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

use crate::geometry::Rect;
use crate::interaction::DEFAULT_SENSITIVITY;
use crate::render::DrawSettings;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Source rectangle of the warp
    #[serde(default)]
    pub base: Rect,

    /// Corner selection radius as a fraction of the base diagonal
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Handle key events while active
    #[serde(default = "default_true")]
    pub keys: bool,

    /// Handle pointer events while active
    #[serde(default = "default_true")]
    pub pointer: bool,

    #[serde(default)]
    pub draw: DrawSettings,
}

fn default_sensitivity() -> f64 {
    DEFAULT_SENSITIVITY
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: Rect::default(),
            sensitivity: DEFAULT_SENSITIVITY,
            keys: true,
            pointer: true,
            draw: DrawSettings::default(),
        }
    }
}

impl Config {
    /// Read the config keys out of a document, ignoring any other groups
    pub fn from_document(doc: &Table) -> Result<Self> {
        Value::Table(doc.clone())
            .try_into()
            .context("Failed to parse configuration")
    }

    /// Overwrite the config keys of a document, keeping any other groups
    pub fn write_to_document(&self, doc: &mut Table) -> Result<()> {
        match Value::try_from(self).context("Failed to serialize configuration")? {
            Value::Table(table) => {
                for (key, value) in table {
                    doc.insert(key, value);
                }
                Ok(())
            }
            other => anyhow::bail!("Configuration serialized to {}", other.type_str()),
        }
    }
}

/// A config file on disk together with its full document
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub config: Config,
    /// Everything in the file, including groups owned by the warper
    pub document: Table,
}

impl ConfigFile {
    /// Load configuration from a file, or create default if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let document: Table = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", path))?;
            let config = Config::from_document(&document)
                .with_context(|| format!("Invalid config in {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(Self {
                path: path.to_path_buf(),
                config,
                document,
            })
        } else {
            let mut file = Self {
                path: path.to_path_buf(),
                config: Config::default(),
                document: Table::new(),
            };
            file.save()?;
            tracing::info!("Created default configuration at {:?}", path);
            Ok(file)
        }
    }

    /// Save configuration to its file
    pub fn save(&mut self) -> Result<()> {
        self.config.write_to_document(&mut self.document)?;
        let content =
            toml::to_string_pretty(&self.document).context("Failed to serialize configuration")?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {:?}", parent))?;
            }
        }

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        tracing::info!("Saved configuration to {:?}", self.path);
        Ok(())
    }
}
