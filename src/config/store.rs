//! The configuration store
//!
//! One `ConfigStore` is built at startup and passed by reference to the parts
//! of the mapper that read it. Writes happen during configuration, before any
//! concurrent use.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info, trace};

use crate::driver::SessionRegistry;
use crate::mapping::{MappingEngine, StandardMapping};

use super::errors::{ConfigError, ConfigLoadError, ConfigResult};
use super::logger::{HostEnvironment, JsonLogger, Logger, LoggerSetting};
use super::options::{self, OptionRegistry};
use super::settings::{
    normalize_keys, DatabaseConfig, FileSettingsLoader, SessionConfig, SettingsLoader,
};

/// Alias of the database purged by [`ConfigStore::purge`]
pub const DEFAULT_ALIAS: &str = "default";

/// Namespaces never dropped by a purge
const PROTECTED_NAMESPACE_PATTERN: &str = r"system|\$";

/// Mapper configuration
pub struct ConfigStore {
    options: OptionRegistry,
    databases: BTreeMap<String, DatabaseConfig>,
    sessions: BTreeMap<String, SessionConfig>,
    logger: Option<Arc<dyn Logger>>,
    host: Option<Arc<dyn HostEnvironment>>,
    mapping: Arc<dyn MappingEngine>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Store with the standard options declared
    pub fn new() -> Self {
        Self::with_options(OptionRegistry::standard())
    }

    /// Store with no options declared
    pub fn empty() -> Self {
        Self::with_options(OptionRegistry::new())
    }

    fn with_options(options: OptionRegistry) -> Self {
        Self {
            options,
            databases: BTreeMap::new(),
            sessions: BTreeMap::new(),
            logger: None,
            host: None,
            mapping: Arc::new(StandardMapping),
        }
    }

    /// Attach the embedding application
    pub fn with_host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = Some(host);
        self
    }

    /// Replace the mapping engine
    pub fn with_mapping_engine(mut self, mapping: Arc<dyn MappingEngine>) -> Self {
        self.mapping = mapping;
        self
    }

    // ==================
    // Options
    // ==================

    /// Declare an option with its default
    pub fn declare(&mut self, name: impl Into<String>, default: Value) {
        self.options.declare(name, default);
    }

    /// Current value of an option
    pub fn get(&self, name: &str) -> ConfigResult<&Value> {
        self.options.get(name)
    }

    /// Set an option
    pub fn set(&mut self, name: &str, value: Value) -> ConfigResult<()> {
        self.options.set(name, value)
    }

    /// Boolean value of a flag option
    pub fn flag(&self, name: &str) -> ConfigResult<bool> {
        let value = self.get(name)?;
        value
            .as_bool()
            .ok_or_else(|| ConfigError::InvalidOptionValue {
                name: name.to_string(),
                expected: "a boolean",
                value: value.clone(),
            })
    }

    /// Whether index specs are created as soon as they are declared
    pub fn autocreate_indexes(&self) -> ConfigResult<bool> {
        self.flag(options::AUTOCREATE_INDEXES)
    }

    /// Whether documents accept undeclared fields
    pub fn allow_dynamic_fields(&self) -> ConfigResult<bool> {
        self.flag(options::ALLOW_DYNAMIC_FIELDS)
    }

    /// Whether lookups of missing documents fail
    pub fn raise_not_found_error(&self) -> ConfigResult<bool> {
        self.flag(options::RAISE_NOT_FOUND_ERROR)
    }

    /// Whether times are returned in UTC
    pub fn use_utc(&self) -> ConfigResult<bool> {
        self.flag(options::USE_UTC)
    }

    /// Configured time zone name
    pub fn time_zone(&self) -> ConfigResult<Option<&str>> {
        Ok(self.get(options::TIME_ZONE)?.as_str())
    }

    /// Restore every option to its default
    pub fn reset(&mut self) {
        self.options.reset();
    }

    /// Defaults of every declared option
    pub fn defaults(&self) -> Map<String, Value> {
        self.options.defaults()
    }

    /// Current value of every declared option
    pub fn settings(&self) -> Map<String, Value> {
        self.options.snapshot()
    }

    /// The underlying option registry
    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    // ==================
    // Databases and sessions
    // ==================

    /// Database descriptors by alias
    pub fn databases(&self) -> &BTreeMap<String, DatabaseConfig> {
        &self.databases
    }

    /// Replace all database descriptors
    pub fn set_databases(&mut self, databases: BTreeMap<String, DatabaseConfig>) {
        self.databases = databases;
    }

    /// Session descriptors by alias
    pub fn sessions(&self) -> &BTreeMap<String, SessionConfig> {
        &self.sessions
    }

    /// Replace all session descriptors
    pub fn set_sessions(&mut self, sessions: BTreeMap<String, SessionConfig>) {
        self.sessions = sessions;
    }

    // ==================
    // Loading
    // ==================

    /// Load settings through `loader` and apply them.
    ///
    /// Returns the loaded document; `None` when the loader had nothing.
    pub fn load(
        &mut self,
        loader: &dyn SettingsLoader,
        path: &Path,
    ) -> ConfigResult<Option<Value>> {
        let settings = loader.load(path)?;
        match &settings {
            Some(document) => {
                info!(path = %path.display(), "Applying settings");
                self.apply_settings(document.clone())?;
            }
            None => debug!(path = %path.display(), "No settings to apply"),
        }
        Ok(settings)
    }

    /// Load a JSON settings file, selecting the `DOCMAPPER_ENV` section
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Option<Value>> {
        self.load(&FileSettingsLoader::from_env(), path.as_ref())
    }

    /// Merge a settings document into the store.
    ///
    /// Sections are applied in order: `databases`, `options`, `sessions`.
    /// This is not atomic. When an option fails, the databases and the
    /// options before it stay applied and the sessions are not touched.
    pub fn apply_settings(&mut self, settings: Value) -> ConfigResult<()> {
        let Value::Object(mut settings) = normalize_keys(settings) else {
            return Err(ConfigLoadError::Malformed("settings must be an object".into()).into());
        };

        if let Some(databases) = section(&mut settings, "databases")? {
            self.databases = descriptors(databases, "databases", DatabaseConfig::new)?;
        }

        if let Some(options) = section(&mut settings, "options")? {
            for (name, value) in options {
                trace!(option = %name, value = %value, "Setting option");
                self.set(&name, value)?;
            }
        }

        if let Some(sessions) = section(&mut settings, "sessions")? {
            self.sessions = descriptors(sessions, "sessions", SessionConfig::new)?;
        }

        Ok(())
    }

    // ==================
    // Logger
    // ==================

    /// Host logger if the host has one, otherwise a stdout logger
    pub fn default_logger(&self) -> Arc<dyn Logger> {
        self.host
            .as_ref()
            .and_then(|host| host.logger())
            .unwrap_or_else(|| Arc::new(JsonLogger::stdout()))
    }

    /// The configured logger, resolving and caching the default if unset
    pub fn resolve_logger(&mut self) -> Arc<dyn Logger> {
        if let Some(logger) = &self.logger {
            return Arc::clone(logger);
        }
        let logger = self.default_logger();
        self.logger = Some(Arc::clone(&logger));
        logger
    }

    /// The configured logger without resolving a default
    pub fn logger(&self) -> Option<Arc<dyn Logger>> {
        self.logger.clone()
    }

    /// Change the logger. Settings that are not loggers are ignored.
    pub fn set_logger(&mut self, setting: impl Into<LoggerSetting>) {
        match setting.into() {
            LoggerSetting::Disabled => self.logger = None,
            LoggerSetting::Default => self.logger = Some(self.default_logger()),
            LoggerSetting::Custom(logger) => self.logger = Some(logger),
            LoggerSetting::Ignored => trace!("Ignoring logger setting that is not a logger"),
        }
    }

    // ==================
    // Administration
    // ==================

    /// Field names that would shadow mapping engine methods
    pub fn destructive_fields(&self) -> BTreeSet<String> {
        self.mapping.prohibited_method_names()
    }

    /// Drop every non-system collection in the default database.
    ///
    /// The namespace filter sent to the driver matches `db.collection`. The
    /// names it returns are screened again on the collection part alone, so
    /// a database name that contains `system` does not hide its collections
    /// from drivers that leave filtering to the client.
    ///
    /// Stops at the first failed drop. Returns the dropped collection names.
    pub fn purge(&self, registry: &dyn SessionRegistry) -> ConfigResult<Vec<String>> {
        let database = self
            .databases
            .get(DEFAULT_ALIAS)
            .and_then(DatabaseConfig::name)
            .ok_or(ConfigError::MissingDefaultDatabase)?;
        let protected = protected_namespaces();

        let mut session = registry.default_session()?;
        session.use_database(database)?;

        let filter = json!({ "name": { "$not": { "$regex": PROTECTED_NAMESPACE_PATTERN } } });
        let namespaces = session.collection("system.namespaces").find(&filter)?;

        let mut dropped = Vec::new();
        for namespace in namespaces {
            let Some(full_name) = namespace.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some((_, name)) = full_name.split_once('.') else {
                continue;
            };
            if protected.is_match(name) {
                continue;
            }

            session.collection(name).drop_collection()?;
            debug!(database, collection = name, "Dropped collection");
            dropped.push(name.to_string());
        }

        info!(database, dropped = dropped.len(), "Purged default database");
        Ok(dropped)
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("options", &self.options)
            .field("databases", &self.databases)
            .field("sessions", &self.sessions)
            .field("logger", &self.logger.is_some())
            .field("host", &self.host.is_some())
            .finish()
    }
}

fn protected_namespaces() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(PROTECTED_NAMESPACE_PATTERN).expect("protected namespace pattern is valid")
    })
}

/// Take `key` out of the settings; null counts as absent
fn section(
    settings: &mut Map<String, Value>,
    key: &str,
) -> ConfigResult<Option<Map<String, Value>>> {
    match settings.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ConfigLoadError::Malformed(format!(
            "'{}' must be an object, got {}",
            key, other
        ))
        .into()),
    }
}

fn descriptors<T>(
    entries: Map<String, Value>,
    section: &str,
    wrap: fn(Map<String, Value>) -> T,
) -> ConfigResult<BTreeMap<String, T>> {
    entries
        .into_iter()
        .map(|(alias, descriptor)| match descriptor {
            Value::Object(map) => Ok((alias, wrap(map))),
            other => Err(ConfigError::from(ConfigLoadError::Malformed(format!(
                "{}.{} must be an object, got {}",
                section, alias, other
            )))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::logger::Severity;
    use crate::driver::{DriverCall, MemoryStore};

    struct NullLogger;

    impl Logger for NullLogger {
        fn log(&self, _severity: Severity, _event: &str, _fields: &[(&str, &str)]) {}
    }

    struct Host(Arc<dyn Logger>);

    impl HostEnvironment for Host {
        fn logger(&self) -> Option<Arc<dyn Logger>> {
            Some(Arc::clone(&self.0))
        }
    }

    fn configured_store() -> ConfigStore {
        let mut config = ConfigStore::new();
        config
            .apply_settings(json!({
                "databases": { "default": { "name": "app_test" } }
            }))
            .unwrap();
        config
    }

    #[test]
    fn test_defaults_before_set() {
        let config = ConfigStore::new();
        for (name, default) in options::standard_options() {
            assert_eq!(config.get(name).unwrap(), &default);
        }
        assert!(config.databases().is_empty());
        assert!(config.sessions().is_empty());
    }

    #[test]
    fn test_empty_store_rejects_standard_names() {
        let config = ConfigStore::empty();
        assert!(matches!(
            config.autocreate_indexes(),
            Err(ConfigError::UnknownOption(_))
        ));
    }

    #[test]
    fn test_typed_accessors() {
        let mut config = ConfigStore::new();
        assert!(config.allow_dynamic_fields().unwrap());
        assert!(config.raise_not_found_error().unwrap());
        assert_eq!(config.time_zone().unwrap(), None);

        config.set(options::TIME_ZONE, json!("UTC")).unwrap();
        config.set(options::USE_UTC, json!(true)).unwrap();
        assert_eq!(config.time_zone().unwrap(), Some("UTC"));
        assert!(config.use_utc().unwrap());
    }

    #[test]
    fn test_apply_settings_rejects_non_object() {
        let mut config = ConfigStore::new();
        let err = config.apply_settings(json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), "DOCMAP_CONFIG_LOAD_FAILED");
    }

    #[test]
    fn test_apply_settings_null_sections_untouched() {
        let mut config = configured_store();
        config
            .apply_settings(json!({ "databases": null, "options": null }))
            .unwrap();
        assert!(config.databases().contains_key("default"));
    }

    #[test]
    fn test_custom_logger_kept() {
        let mut config = ConfigStore::new();
        let custom: Arc<dyn Logger> = Arc::new(NullLogger);
        config.set_logger(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&config.resolve_logger(), &custom));
    }

    #[test]
    fn test_host_logger_preferred() {
        let host_logger: Arc<dyn Logger> = Arc::new(NullLogger);
        let mut config = ConfigStore::new().with_host(Arc::new(Host(Arc::clone(&host_logger))));
        assert!(Arc::ptr_eq(&config.resolve_logger(), &host_logger));
    }

    #[test]
    fn test_resolve_logger_is_cached() {
        let mut config = ConfigStore::new();
        let first = config.resolve_logger();
        let second = config.resolve_logger();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_disabled_logger_resolves_again() {
        let host_logger: Arc<dyn Logger> = Arc::new(NullLogger);
        let mut config = ConfigStore::new().with_host(Arc::new(Host(Arc::clone(&host_logger))));
        config.set_logger(Arc::new(NullLogger) as Arc<dyn Logger>);

        config.set_logger(json!(false));
        assert!(config.logger().is_none());
        assert!(Arc::ptr_eq(&config.resolve_logger(), &host_logger));
    }

    #[test]
    fn test_true_forces_default() {
        let host_logger: Arc<dyn Logger> = Arc::new(NullLogger);
        let mut config = ConfigStore::new().with_host(Arc::new(Host(Arc::clone(&host_logger))));
        config.set_logger(Arc::new(NullLogger) as Arc<dyn Logger>);

        config.set_logger(json!(true));
        assert!(Arc::ptr_eq(&config.logger().unwrap(), &host_logger));
    }

    #[test]
    fn test_destructive_fields_passthrough() {
        let config = ConfigStore::new();
        assert_eq!(
            config.destructive_fields(),
            StandardMapping.prohibited_method_names()
        );
    }

    #[test]
    fn test_purge_requires_default_database() {
        let store = MemoryStore::new();
        let config = ConfigStore::new();
        assert!(matches!(
            config.purge(&store),
            Err(ConfigError::MissingDefaultDatabase)
        ));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_purge_screens_collection_part_only() {
        let store = MemoryStore::new();
        store.create_collection("ecosystem_prod", "people");
        store.create_collection("ecosystem_prod", "system.users");
        let mut config = ConfigStore::new();
        config
            .apply_settings(json!({
                "databases": { "default": { "name": "ecosystem_prod" } }
            }))
            .unwrap();

        let dropped = config.purge(&store).unwrap();

        assert_eq!(dropped, vec!["people"]);
        assert_eq!(store.collection_names("ecosystem_prod"), vec!["system.users"]);
    }

    #[test]
    fn test_purge_sends_namespace_filter() {
        let store = MemoryStore::new();
        store.create_collection("app_test", "people");

        configured_store().purge(&store).unwrap();

        let calls = store.calls();
        assert_eq!(calls[0], DriverCall::UseDatabase("app_test".into()));
        assert_eq!(
            calls[1],
            DriverCall::Find {
                collection: "system.namespaces".into(),
                filter: json!({ "name": { "$not": { "$regex": "system|\\$" } } }),
            }
        );
    }
}
