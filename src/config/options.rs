//! Declared configuration options
//!
//! Options are declared once with a default. The default's JSON type fixes
//! the option's kind, and every write is checked against that kind. A null
//! default leaves the option open to any scalar. Names that were never
//! declared cannot be read or written.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::{ConfigError, ConfigResult};

pub const ALLOW_DYNAMIC_FIELDS: &str = "allow_dynamic_fields";
pub const AUTOCREATE_INDEXES: &str = "autocreate_indexes";
pub const IDENTITY_MAP_ENABLED: &str = "identity_map_enabled";
pub const INCLUDE_ROOT_IN_JSON: &str = "include_root_in_json";
pub const INCLUDE_TYPE_FOR_SERIALIZATION: &str = "include_type_for_serialization";
pub const PERSIST_IN_SAFE_MODE: &str = "persist_in_safe_mode";
pub const PRELOAD_MODELS: &str = "preload_models";
pub const RAISE_NOT_FOUND_ERROR: &str = "raise_not_found_error";
pub const SCOPE_OVERWRITE_EXCEPTION: &str = "scope_overwrite_exception";
pub const SKIP_VERSION_CHECK: &str = "skip_version_check";
pub const TIME_ZONE: &str = "time_zone";
pub const USE_ACTIVESUPPORT_TIME_ZONE: &str = "use_activesupport_time_zone";
pub const USE_UTC: &str = "use_utc";

/// The options every store starts with, and their defaults.
pub fn standard_options() -> Vec<(&'static str, Value)> {
    vec![
        (ALLOW_DYNAMIC_FIELDS, Value::Bool(true)),
        (AUTOCREATE_INDEXES, Value::Bool(false)),
        (IDENTITY_MAP_ENABLED, Value::Bool(false)),
        (INCLUDE_ROOT_IN_JSON, Value::Bool(false)),
        (INCLUDE_TYPE_FOR_SERIALIZATION, Value::Bool(false)),
        (PERSIST_IN_SAFE_MODE, Value::Bool(false)),
        (PRELOAD_MODELS, Value::Bool(false)),
        (RAISE_NOT_FOUND_ERROR, Value::Bool(true)),
        (SCOPE_OVERWRITE_EXCEPTION, Value::Bool(false)),
        (SKIP_VERSION_CHECK, Value::Bool(false)),
        (TIME_ZONE, Value::Null),
        (USE_ACTIVESUPPORT_TIME_ZONE, Value::Bool(true)),
        (USE_UTC, Value::Bool(false)),
    ]
}

/// Value kind accepted by an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean switch
    Flag,
    /// Number or null
    Number,
    /// String or null
    Text,
    /// Any scalar: boolean, number, string or null
    Any,
}

impl OptionKind {
    /// Kind implied by a default value
    pub fn of(default: &Value) -> Self {
        match default {
            Value::Bool(_) => OptionKind::Flag,
            Value::Number(_) => OptionKind::Number,
            Value::String(_) => OptionKind::Text,
            _ => OptionKind::Any,
        }
    }

    /// Whether `value` can be stored in an option of this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            OptionKind::Flag => value.is_boolean(),
            OptionKind::Number => value.is_number() || value.is_null(),
            OptionKind::Text => value.is_string() || value.is_null(),
            OptionKind::Any => !value.is_array() && !value.is_object(),
        }
    }

    /// Human-readable kind for error messages
    pub fn expected(&self) -> &'static str {
        match self {
            OptionKind::Flag => "a boolean",
            OptionKind::Number => "a number or null",
            OptionKind::Text => "a string or null",
            OptionKind::Any => "a scalar",
        }
    }
}

/// Kind of a standard option. `time_zone` defaults to null but only ever
/// holds a zone name.
fn standard_kind(name: &str, default: &Value) -> OptionKind {
    match name {
        TIME_ZONE => OptionKind::Text,
        _ => OptionKind::of(default),
    }
}

#[derive(Debug, Clone)]
struct OptionSlot {
    kind: OptionKind,
    default: Value,
    value: Option<Value>,
}

impl OptionSlot {
    fn current(&self) -> &Value {
        self.value.as_ref().unwrap_or(&self.default)
    }
}

/// Registry of declared options
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    slots: BTreeMap<String, OptionSlot>,
}

impl OptionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`standard_options`] declared
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (name, default) in standard_options() {
            let kind = standard_kind(name, &default);
            registry.declare_with_kind(name, default, kind);
        }
        registry
    }

    /// Declare an option, its kind inferred from `default`. Re-declaring
    /// replaces the default and kind but keeps a value that was already set.
    pub fn declare(&mut self, name: impl Into<String>, default: Value) {
        let kind = OptionKind::of(&default);
        self.declare_with_kind(name, default, kind);
    }

    /// Declare an option with an explicit kind
    pub fn declare_with_kind(&mut self, name: impl Into<String>, default: Value, kind: OptionKind) {
        let name = name.into();
        match self.slots.get_mut(&name) {
            Some(slot) => {
                slot.kind = kind;
                slot.default = default;
            }
            None => {
                self.slots.insert(
                    name,
                    OptionSlot {
                        kind,
                        default,
                        value: None,
                    },
                );
            }
        }
    }

    fn slot(&self, name: &str) -> ConfigResult<&OptionSlot> {
        self.slots
            .get(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))
    }

    /// Current value, falling back to the default
    pub fn get(&self, name: &str) -> ConfigResult<&Value> {
        self.slot(name).map(OptionSlot::current)
    }

    /// Declared kind
    pub fn kind(&self, name: &str) -> ConfigResult<OptionKind> {
        self.slot(name).map(|slot| slot.kind)
    }

    /// Declared default
    pub fn default_of(&self, name: &str) -> ConfigResult<&Value> {
        self.slot(name).map(|slot| &slot.default)
    }

    /// Store a value
    pub fn set(&mut self, name: &str, value: Value) -> ConfigResult<()> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?;

        if !slot.kind.accepts(&value) {
            return Err(ConfigError::InvalidOptionValue {
                name: name.to_string(),
                expected: slot.kind.expected(),
                value,
            });
        }

        slot.value = Some(value);
        Ok(())
    }

    /// Whether `name` was declared
    pub fn is_declared(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Restore every option to its default
    pub fn reset(&mut self) {
        for slot in self.slots.values_mut() {
            slot.value = None;
        }
    }

    /// Declared names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Defaults keyed by name
    pub fn defaults(&self) -> Map<String, Value> {
        self.slots
            .iter()
            .map(|(name, slot)| (name.clone(), slot.default.clone()))
            .collect()
    }

    /// Current values keyed by name
    pub fn snapshot(&self) -> Map<String, Value> {
        self.slots
            .iter()
            .map(|(name, slot)| (name.clone(), slot.current().clone()))
            .collect()
    }

    /// Number of declared options
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing was declared
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
