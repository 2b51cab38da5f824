//! Raw configuration document
//!
//! `config.toml` is parsed once into a JSON object so that merge, template
//! and rendering logic work on a single value model. Table order from the
//! file is preserved.
//!
//! JSON has no `inf`/`nan`, so non-finite floats are kept as their text
//! (`inf`, `-inf`, `nan`) and their `(table, key)` position is recorded so
//! they can still be rendered as bare literals.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Default document location, relative to the working directory of the build
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// `(top-level table, key)` pairs whose value was a non-finite float
pub type NonFiniteKeys = BTreeSet<(String, String)>;

/// The parsed configuration file, before any directive extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    entries: Map<String, Value>,
    non_finite: NonFiniteKeys,
    digest: Option<String>,
}

impl RawDocument {
    /// Read and parse the document at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::parse(&contents)?;
        tracing::debug!(
            path = %path.display(),
            digest = document.digest().unwrap_or_default(),
            "loaded configuration document"
        );
        Ok(document)
    }

    /// Parse a document from TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))?;

        let mut non_finite = NonFiniteKeys::new();
        for (name, value) in &table {
            if let toml::Value::Table(inner) = value {
                for (key, v) in inner {
                    if matches!(v, toml::Value::Float(f) if !f.is_finite()) {
                        non_finite.insert((name.clone(), key.clone()));
                    }
                }
            }
        }

        let entries = table
            .into_iter()
            .map(|(k, v)| (k, toml_to_json(v)))
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(contents.as_bytes());

        Ok(Self {
            entries,
            non_finite,
            digest: Some(hex::encode(hasher.finalize())),
        })
    }

    /// Build a document from an already-parsed object. Such a document has
    /// no source text and therefore no digest.
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self {
            entries,
            non_finite: NonFiniteKeys::new(),
            digest: None,
        }
    }

    /// SHA-256 of the TOML source text, hex encoded. `None` for documents
    /// built with [`RawDocument::from_map`].
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Positions of non-finite floats in top-level tables
    pub fn non_finite(&self) -> &NonFiniteKeys {
        &self.non_finite
    }

    pub fn into_parts(self) -> (Map<String, Value>, NonFiniteKeys) {
        (self.entries, self.non_finite)
    }

    /// Pretty-print the whole document for `-dump`.
    pub fn to_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }
}

/// Convert a TOML value into the JSON value model.
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(non_finite_text(f).to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn non_finite_text(f: f64) -> &'static str {
    if f.is_nan() {
        "nan"
    } else if f.is_sign_negative() {
        "-inf"
    } else {
        "inf"
    }
}
