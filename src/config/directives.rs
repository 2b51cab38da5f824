//! Store-wide directives
//!
//! Top-level keys with the `_` prefix control resolution instead of
//! describing a board. They are pulled out of the document once, before any
//! device record is built.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::ConfigError;

/// Prefix marking a top-level key as a directive (or a private entry)
pub const DIRECTIVE_PREFIX: char = '_';

pub const DEFAULTS_KEY: &str = "_defaults";
pub const NULLABLE_KEYS_KEY: &str = "_null_if_empty";
pub const WRAP_KEYS_KEY: &str = "_wrap_in_double_underscore";
pub const RAW_KEYS_KEY: &str = "_not_a_string";

/// Resolution directives extracted from the document
#[derive(Debug, Clone, PartialEq)]
pub struct Directives {
    /// Fallback layer merged under every device record
    pub defaults: Map<String, Value>,

    /// Keys allowed to resolve to NULL when empty
    pub nullable_keys: BTreeSet<String>,

    /// Render flag names as `__NAME__`
    pub wrap_keys: bool,

    /// Keys whose string values are emitted without quotes
    pub raw_keys: BTreeSet<String>,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            defaults: Map::new(),
            nullable_keys: BTreeSet::new(),
            wrap_keys: true,
            raw_keys: BTreeSet::new(),
        }
    }
}

impl Directives {
    /// Remove the directive keys from `document` and collect them.
    ///
    /// Absent directives take their defaults. A directive of the wrong shape
    /// is rejected.
    pub fn extract(document: &mut Map<String, Value>) -> Result<Self, ConfigError> {
        let fallback = Self::default();

        let directives = Self {
            defaults: take(document, DEFAULTS_KEY, "a table")?.unwrap_or(fallback.defaults),
            nullable_keys: take(document, NULLABLE_KEYS_KEY, "an array of strings")?
                .unwrap_or(fallback.nullable_keys),
            wrap_keys: take(document, WRAP_KEYS_KEY, "a boolean")?.unwrap_or(fallback.wrap_keys),
            raw_keys: take(document, RAW_KEYS_KEY, "an array of strings")?
                .unwrap_or(fallback.raw_keys),
        };

        tracing::debug!(
            defaults = directives.defaults.len(),
            nullable = ?directives.nullable_keys,
            wrap = directives.wrap_keys,
            raw = ?directives.raw_keys,
            "extracted directives"
        );

        Ok(directives)
    }

    pub fn is_nullable(&self, key: &str) -> bool {
        self.nullable_keys.contains(key)
    }

    pub fn is_raw(&self, key: &str) -> bool {
        self.raw_keys.contains(key)
    }
}

/// Whether a top-level key names a directive or private entry rather than a device
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(DIRECTIVE_PREFIX)
}

fn take<T: DeserializeOwned>(
    document: &mut Map<String, Value>,
    directive: &str,
    expected: &str,
) -> Result<Option<T>, ConfigError> {
    document
        .remove(directive)
        .map(|value| {
            serde_json::from_value(value).map_err(|_| ConfigError::InvalidDirective {
                directive: directive.to_string(),
                expected: expected.to_string(),
            })
        })
        .transpose()
}
