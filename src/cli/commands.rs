//! CLI command implementations
//!
//! Commands build a fresh `ConfigStore`, never touch a real document store,
//! and return the JSON payload printed by [`run`].

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::{ConfigStore, FileSettingsLoader, DEFAULT_ALIAS};
use crate::driver::{DriverCall, MemoryStore, Session};
use crate::index::{IndexCatalog, ModelDescriptor};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Database name used for planning when the settings name none
const PLAN_DATABASE: &str = "docmapper_plan";

/// One model in a plan-indexes manifest
#[derive(Debug, Clone, Deserialize)]
pub struct ModelManifest {
    pub name: String,
    pub collection: String,
    #[serde(default)]
    pub hereditary: bool,
    #[serde(default)]
    pub indexes: Vec<Value>,
}

impl ModelManifest {
    fn descriptor(&self) -> ModelDescriptor {
        let descriptor = ModelDescriptor::new(&self.name, &self.collection);
        if self.hereditary {
            descriptor.hereditary()
        } else {
            descriptor
        }
    }
}

/// Parse arguments, run the command and print its result
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match run_command(cli.command) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Options => Ok(options()),
        Command::Check {
            config,
            environment,
        } => check(&config, environment.as_deref()),
        Command::PlanIndexes {
            models,
            config,
            environment,
        } => plan_indexes(&models, config.as_deref(), environment.as_deref()),
    }
}

/// Declared options with kind and default
pub fn options() -> Value {
    let config = ConfigStore::new();
    let registry = config.options();
    let declared: Vec<Value> = registry
        .names()
        .filter_map(|name| {
            let kind = registry.kind(name).ok()?;
            let default = registry.default_of(name).ok()?;
            Some(json!({
                "name": name,
                "kind": format!("{:?}", kind).to_lowercase(),
                "default": default,
            }))
        })
        .collect();
    json!({ "options": declared })
}

/// Load `config_path` into a fresh store and describe the result
pub fn check(config_path: &Path, environment: Option<&str>) -> CliResult<Value> {
    let mut config = ConfigStore::new();
    let loaded = load_settings(&mut config, config_path, environment)?;

    Ok(json!({
        "loaded": loaded,
        "environment": environment,
        "options": config.settings(),
        "databases": serde_json::to_value(config.databases())?,
        "sessions": serde_json::to_value(config.sessions())?,
        "destructive_fields": config.destructive_fields(),
    }))
}

/// Register every manifest index in the in-memory driver and report the
/// calls a flush would issue
pub fn plan_indexes(
    models_path: &Path,
    config_path: Option<&Path>,
    environment: Option<&str>,
) -> CliResult<Value> {
    let mut config = ConfigStore::new();
    if let Some(path) = config_path {
        load_settings(&mut config, path, environment)?;
    }

    let content = fs::read_to_string(models_path).map_err(|e| {
        CliError::manifest_error(format!("Failed to read {}: {}", models_path.display(), e))
    })?;
    let manifest: Vec<ModelManifest> = serde_json::from_str(&content)
        .map_err(|e| CliError::manifest_error(format!("Invalid manifest JSON: {}", e)))?;

    let database = config
        .databases()
        .get(DEFAULT_ALIAS)
        .and_then(|db| db.name())
        .unwrap_or(PLAN_DATABASE)
        .to_string();

    let store = MemoryStore::new();
    let mut session = store.session();
    session
        .use_database(&database)
        .map_err(|e| CliError::io_error(e.to_string()))?;

    let mut catalog = IndexCatalog::new();
    for model in &manifest {
        let collection = session.collection(&model.collection);
        let registry = catalog.registry_for(&model.descriptor());
        for definition in &model.indexes {
            registry.index(definition, &config, collection.as_ref())?;
        }
        registry.add_default_indexes(&config, collection.as_ref())?;
    }

    store.clear_calls();
    let total = catalog.create_all(&session)?;
    info!(models = catalog.len(), calls = total, "Planned indexes");

    let calls: Vec<Value> = store
        .index_calls()
        .into_iter()
        .filter_map(|call| match call {
            DriverCall::CreateIndex {
                collection,
                keys,
                options,
            } => Some(json!({ "collection": collection, "keys": keys, "options": options })),
            _ => None,
        })
        .collect();

    Ok(json!({
        "database": database,
        "autocreate_indexes": config.autocreate_indexes()?,
        "calls": calls,
    }))
}

fn load_settings(
    config: &mut ConfigStore,
    path: &Path,
    environment: Option<&str>,
) -> CliResult<bool> {
    let loader = match environment {
        Some(env) => FileSettingsLoader::for_environment(env),
        None => FileSettingsLoader::new(),
    };
    Ok(config.load(&loader, path)?.is_some())
}
