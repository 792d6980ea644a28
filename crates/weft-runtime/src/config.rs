//! Binder configuration (weft.toml)
//!
//! Selects the backend and its options:
//!
//! ```toml
//! [binder]
//! mode = "write"
//! trusted = true
//! ignore_can_convert_for_strings = false
//!
//! [binder.owner]
//! module = "app"
//! type = "app.MainWindow"
//! ```
//!
//! `write` builds object graphs from documents and `read` walks graphs to
//! serialize them. A trusted configuration with an owner gets the compiling
//! backend acting with that owner's rights; anything else gets the reflective
//! backend.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use weft_schema::TypeRegistry;

use crate::binder::{BinderOptions, CompilingBinder, OwningModule, ReflectiveBinder, RuntimeBinder};
use crate::context::BindMode;

/// Errors that can occur while loading a configuration or applying it
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read binder config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse binder config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to render TOML
    #[error("Failed to write binder config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error
    #[error("Invalid binder config: {0}")]
    Validation(String),

    /// Owner module is not registered
    #[error("Unknown owner module: {0}")]
    UnknownModule(String),

    /// Owner type is not registered
    #[error("Unknown owner type: {0}")]
    UnknownType(String),
}

/// Root of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BinderConfig {
    /// Binder settings
    #[serde(default)]
    pub binder: BinderSection,
}

/// `[binder]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinderSection {
    /// `write` to build graphs, `read` to serialize them
    #[serde(default)]
    pub mode: BindMode,

    /// Whether the documents may use adapters with owner rights
    #[serde(default = "default_trusted")]
    pub trusted: bool,

    /// Convert text without asking the converter first
    #[serde(default)]
    pub ignore_can_convert_for_strings: bool,

    /// Owner whose rights the compiling backend acts with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerSection>,
}

fn default_trusted() -> bool {
    true
}

impl Default for BinderSection {
    fn default() -> Self {
        Self {
            mode: BindMode::default(),
            trusted: default_trusted(),
            ignore_can_convert_for_strings: false,
            owner: None,
        }
    }
}

/// `[binder.owner]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnerSection {
    /// Owning module name
    pub module: String,

    /// Designated owner type (full name)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<String>,
}

impl BinderConfig {
    /// Parse a configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BinderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(owner) = &self.binder.owner {
            if owner.module.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "owner module name cannot be empty".to_string(),
                ));
            }
            if owner.owner_type.as_deref().map_or(false, |t| t.trim().is_empty()) {
                return Err(ConfigError::Validation(
                    "owner type name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Write the configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Binder options described by this configuration
    pub fn options(&self) -> BinderOptions {
        BinderOptions::new(self.binder.mode)
            .ignore_can_convert_for_strings(self.binder.ignore_can_convert_for_strings)
    }

    /// Owner rights granted by this configuration, if any
    pub fn owning_module(
        &self,
        registry: &TypeRegistry,
    ) -> Result<Option<OwningModule>, ConfigError> {
        let owner = match (&self.binder.owner, self.binder.trusted) {
            (Some(owner), true) => owner,
            _ => return Ok(None),
        };
        let module = registry
            .module_by_name(&owner.module)
            .ok_or_else(|| ConfigError::UnknownModule(owner.module.clone()))?;
        let mut owning = OwningModule::new(module);
        if let Some(name) = &owner.owner_type {
            let desc = registry
                .by_name(name)
                .ok_or_else(|| ConfigError::UnknownType(name.clone()))?;
            owning = owning.with_owner_type(desc.key);
        }
        Ok(Some(owning))
    }
}

/// Build the binder a configuration asks for
pub fn binder_from_config(
    config: &BinderConfig,
    registry: Arc<TypeRegistry>,
) -> Result<Arc<dyn RuntimeBinder>, ConfigError> {
    binder_with_options(config, registry, config.options())
}

/// Like [`binder_from_config`], with caller-supplied options (shared
/// converter cache, attached-property store); `mode` and the legacy flag
/// still come from the configuration
pub fn binder_with_options(
    config: &BinderConfig,
    registry: Arc<TypeRegistry>,
    options: BinderOptions,
) -> Result<Arc<dyn RuntimeBinder>, ConfigError> {
    let options = BinderOptions {
        mode: config.binder.mode,
        ignore_can_convert_for_strings: config.binder.ignore_can_convert_for_strings,
        ..options
    };
    let binder: Arc<dyn RuntimeBinder> = match config.owning_module(&registry)? {
        Some(owner) => Arc::new(CompilingBinder::new(registry, owner, options)),
        None => Arc::new(ReflectiveBinder::new(registry, options)),
    };
    debug!(
        backend = %binder.backend(),
        mode = %config.binder.mode,
        trusted = config.binder.trusted,
        "binder selected"
    );
    Ok(binder)
}
