//! Settings documents and how they are loaded
//!
//! A settings document is a JSON object with optional `databases`,
//! `sessions` and `options` sections, optionally nested one level under
//! environment names. Keys are normalized at ingestion: a leading `:` is
//! stripped from every object key, so `":options"` and `"options"` name the
//! same section.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{ConfigLoadError, ConfigResult};

/// Environment variable naming the settings section to load
pub const ENVIRONMENT_VAR: &str = "DOCMAPPER_ENV";

/// Canonical form of a settings key
pub fn canonical_key(key: &str) -> &str {
    key.strip_prefix(':').unwrap_or(key)
}

/// Recursively rewrite every object key to its canonical form.
///
/// When two keys collapse to the same canonical key the later one wins.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (canonical_key(&key).to_string(), normalize_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Connection descriptor for one database alias.
///
/// The raw descriptor is kept as loaded; nothing is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseConfig(Map<String, Value>);

impl DatabaseConfig {
    /// Wrap a descriptor object
    pub fn new(descriptor: Map<String, Value>) -> Self {
        Self(descriptor)
    }

    /// Database name on the server
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// `host:port` seeds
    pub fn hosts(&self) -> Vec<&str> {
        self.0
            .get("hosts")
            .and_then(Value::as_array)
            .map(|hosts| hosts.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Driver options
    pub fn options(&self) -> Option<&Map<String, Value>> {
        self.0.get("options").and_then(Value::as_object)
    }

    /// Raw descriptor
    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Descriptor for one session alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionConfig(Map<String, Value>);

impl SessionConfig {
    /// Wrap a descriptor object
    pub fn new(descriptor: Map<String, Value>) -> Self {
        Self(descriptor)
    }

    /// Database alias this session connects to
    pub fn database(&self) -> Option<&str> {
        self.0.get("database").and_then(Value::as_str)
    }

    /// Connection URI, when given instead of a database alias
    pub fn uri(&self) -> Option<&str> {
        self.0.get("uri").and_then(Value::as_str)
    }

    /// Session options
    pub fn options(&self) -> Option<&Map<String, Value>> {
        self.0.get("options").and_then(Value::as_object)
    }

    /// Raw descriptor
    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Source of settings documents.
pub trait SettingsLoader {
    /// Load the document at `path`. `Ok(None)` means there is nothing to
    /// apply.
    fn load(&self, path: &Path) -> ConfigResult<Option<Value>>;
}

/// Loads JSON settings files from disk.
#[derive(Debug, Clone, Default)]
pub struct FileSettingsLoader {
    environment: Option<String>,
}

impl FileSettingsLoader {
    /// Loader returning the whole document
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader returning the section for `environment`
    pub fn for_environment(environment: impl Into<String>) -> Self {
        Self {
            environment: Some(environment.into()),
        }
    }

    /// Loader using the section named by `DOCMAPPER_ENV`, if set
    pub fn from_env() -> Self {
        Self {
            environment: std::env::var(ENVIRONMENT_VAR)
                .ok()
                .filter(|env| !env.trim().is_empty()),
        }
    }

    /// Selected environment
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    fn read(&self, path: &Path) -> Result<Option<Value>, ConfigLoadError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigLoadError::FileNotFound(path.to_path_buf()),
            _ => ConfigLoadError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let document: Value =
            serde_json::from_str(&content).map_err(|e| ConfigLoadError::Parse {
                path: PathBuf::from(path),
                source: e,
            })?;
        let document = normalize_keys(document);

        let selected = match &self.environment {
            Some(env) => document.get(canonical_key(env)).cloned(),
            None => Some(document),
        };

        Ok(selected.filter(|settings| !settings.is_null()))
    }
}

impl SettingsLoader for FileSettingsLoader {
    fn load(&self, path: &Path) -> ConfigResult<Option<Value>> {
        Ok(self.read(path)?)
    }
}
