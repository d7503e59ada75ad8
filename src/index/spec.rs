//! Index specifications
//!
//! A definition such as `{"name": -1, "unique": true}` is split into its
//! key (the first entry) and its options (every other entry, merged over
//! `{"unique": false}`).

use std::fmt;

use serde_json::{Map, Number, Value};

use super::errors::{IndexError, IndexResult};

/// Index direction or special index kind
#[derive(Debug, Clone, PartialEq)]
pub enum IndexDirection {
    Ascending,
    Descending,
    /// Any other non-zero number, sent to the driver as written
    Numeric(Number),
    /// Special kinds such as `"2d"`, `"text"` or `"hashed"`
    Kind(String),
}

impl IndexDirection {
    /// Parse a non-zero number or a kind string
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(IndexDirection::Ascending),
                Some(-1) => Some(IndexDirection::Descending),
                _ if n.as_f64() == Some(0.0) => None,
                _ => Some(IndexDirection::Numeric(n.clone())),
            },
            Value::String(kind) if !kind.is_empty() => Some(IndexDirection::Kind(kind.clone())),
            _ => None,
        }
    }

    /// Driver representation
    pub fn to_value(&self) -> Value {
        match self {
            IndexDirection::Ascending => Value::from(1),
            IndexDirection::Descending => Value::from(-1),
            IndexDirection::Numeric(n) => Value::Number(n.clone()),
            IndexDirection::Kind(kind) => Value::String(kind.clone()),
        }
    }
}

impl fmt::Display for IndexDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexDirection::Ascending => write!(f, "1"),
            IndexDirection::Descending => write!(f, "-1"),
            IndexDirection::Numeric(n) => write!(f, "{}", n),
            IndexDirection::Kind(kind) => write!(f, "{}", kind),
        }
    }
}

/// Field and direction identifying an index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexKey {
    pub field: String,
    pub direction: IndexDirection,
}

impl IndexKey {
    pub fn new(field: impl Into<String>, direction: IndexDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, IndexDirection::Ascending)
    }

    /// `{field: direction}` document for the driver
    pub fn to_document(&self) -> Value {
        let mut keys = Map::new();
        keys.insert(self.field.clone(), self.direction.to_value());
        Value::Object(keys)
    }
}

/// Options sent along with an index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexOptions {
    pub unique: bool,
    pub background: Option<bool>,
    /// Driver passthrough flags (`sparse`, `name`, `expire_after_seconds`, ...).
    /// Non-boolean `unique` or `background` values also land here.
    pub extra: Map<String, Value>,
}

impl IndexOptions {
    pub fn unique() -> Self {
        Self {
            unique: true,
            ..Self::default()
        }
    }

    pub fn background(mut self, background: bool) -> Self {
        self.background = Some(background);
        self
    }

    /// Options document for the driver
    pub fn to_document(&self) -> Value {
        let mut options = Map::new();
        options.insert("unique".into(), Value::Bool(self.unique));
        if let Some(background) = self.background {
            options.insert("background".into(), Value::Bool(background));
        }
        for (key, value) in &self.extra {
            options.insert(key.clone(), value.clone());
        }
        Value::Object(options)
    }
}

/// A normalized index declaration
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub key: IndexKey,
    pub options: IndexOptions,
}

impl IndexSpec {
    pub fn new(key: IndexKey, options: IndexOptions) -> Self {
        Self { key, options }
    }

    /// Indexed field
    pub fn field(&self) -> &str {
        &self.key.field
    }

    /// Split a definition object into key and options.
    ///
    /// Only the first entry becomes the key. Any later entry, including one
    /// that looks like another field, is passed through as an option.
    /// A `unique` or `background` value that is not a boolean is handed to
    /// the driver unchanged.
    pub fn parse(definition: &Value) -> IndexResult<Self> {
        let Value::Object(entries) = definition else {
            return Err(IndexError::invalid(format!(
                "definition must be an object, got {}",
                definition
            )));
        };

        let mut entries = entries.iter();
        let (field, direction) = entries
            .next()
            .ok_or_else(|| IndexError::invalid("definition has no field"))?;

        if field.is_empty() {
            return Err(IndexError::invalid("field name is empty"));
        }
        let direction = IndexDirection::from_value(direction).ok_or_else(|| {
            IndexError::invalid(format!("invalid direction {} for '{}'", direction, field))
        })?;

        let mut options = IndexOptions::default();
        for (name, value) in entries {
            match (name.as_str(), value) {
                ("unique", Value::Bool(unique)) => options.unique = *unique,
                ("background", Value::Bool(background)) => options.background = Some(*background),
                _ => {
                    options.extra.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(Self::new(IndexKey::new(field.clone(), direction), options))
    }
}
