//! Resolved per-device configuration store
//!
//! Every device record is merged over `_defaults`, interpolated and
//! validated when the store is built. A store that constructs successfully
//! only holds valid records.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::directives::{is_reserved, Directives, DEFAULTS_KEY};
use super::document::{NonFiniteKeys, RawDocument};
use super::merge::merge_tables;
use super::template::{interpolate, is_template, is_truthy};
use super::ConfigError;
use crate::flags::Flag;

/// Final configuration for one device. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    identifier: String,
    values: Map<String, Value>,
    literal_keys: BTreeSet<String>,
}

impl ResolvedConfig {
    /// Uppercased hardware identifier this record belongs to
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Key/value pairs in resolution order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Whether `key` holds a non-finite float (`inf`, `-inf`, `nan`) kept as text
    pub fn is_literal(&self, key: &str) -> bool {
        self.literal_keys.contains(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// All resolved device records plus the directives that shape rendering
#[derive(Debug, Clone)]
pub struct ConfigStore {
    directives: Directives,
    configs: BTreeMap<String, ResolvedConfig>,
}

impl ConfigStore {
    /// Load and resolve the document at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_document(RawDocument::load(path)?)
    }

    /// Parse and resolve a document from TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Self::from_document(RawDocument::parse(contents)?)
    }

    /// Resolve every device record in `document`.
    pub fn from_document(document: RawDocument) -> Result<Self, ConfigError> {
        let (mut entries, non_finite) = document.into_parts();
        let directives = Directives::extract(&mut entries)?;

        let mut configs = BTreeMap::new();
        for (identifier, record) in entries {
            if is_reserved(&identifier) {
                tracing::debug!(key = %identifier, "skipping private entry");
                continue;
            }

            let record = match record {
                Value::Object(map) => map,
                _ => return Err(ConfigError::InvalidRecord { identifier }),
            };

            let resolved = build_config(&identifier, record, &directives, &non_finite)?;
            tracing::debug!(
                identifier = %resolved.identifier,
                keys = resolved.len(),
                "resolved device record"
            );
            if let Some(previous) = configs.insert(resolved.identifier.clone(), resolved) {
                tracing::warn!(
                    identifier = %previous.identifier,
                    "identifier appears more than once, last record wins"
                );
            }
        }

        Ok(Self {
            directives,
            configs,
        })
    }

    /// Look up the resolved record for a hardware identifier, ignoring case.
    pub fn get_for(&self, identifier: &str) -> Result<&ResolvedConfig, ConfigError> {
        let identifier = identifier.to_uppercase();
        self.configs
            .get(&identifier)
            .ok_or(ConfigError::NotFound(identifier))
    }

    /// One flag per resolved key, in resolution order.
    pub fn flags(&self, config: &ResolvedConfig) -> Vec<Flag> {
        config
            .iter()
            .map(|(key, value)| {
                Flag::new(key, value, &self.directives, config.is_literal(key))
            })
            .collect()
    }

    /// Render a resolved record as newline-separated `-D` flags.
    pub fn render_flags(&self, config: &ResolvedConfig) -> String {
        self.flags(config)
            .iter()
            .map(Flag::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// Known identifiers, uppercased
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// Merge, interpolate and validate one device record.
fn build_config(
    identifier: &str,
    record: Map<String, Value>,
    directives: &Directives,
    non_finite: &NonFiniteKeys,
) -> Result<ResolvedConfig, ConfigError> {
    let own_keys: BTreeSet<String> = record.keys().cloned().collect();
    let merged = merge_tables(directives.defaults.clone(), record);

    // Top-level values are taken whole from the record or from the defaults
    let literal_keys = merged
        .keys()
        .filter(|key| {
            let table = if own_keys.contains(*key) {
                identifier
            } else {
                DEFAULTS_KEY
            };
            non_finite.contains(&(table.to_string(), key.to_string()))
        })
        .cloned()
        .collect();

    let mut values = Map::new();
    for (key, value) in &merged {
        let resolved = if is_truthy(value) {
            match value {
                Value::String(s) if is_template(s) => {
                    let text = interpolate(s, &merged).map_err(|source| ConfigError::Template {
                        identifier: identifier.to_string(),
                        source,
                    })?;
                    Value::String(text)
                }
                other => other.clone(),
            }
        } else if directives.is_nullable(key) {
            Value::Null
        } else {
            return Err(ConfigError::Validation {
                key: key.clone(),
                identifier: identifier.to_string(),
            });
        };
        values.insert(key.clone(), resolved);
    }

    Ok(ResolvedConfig {
        identifier: identifier.to_uppercase(),
        values,
        literal_keys,
    })
}
