//! Board configuration resolution
//!
//! Loads `config.toml`, separates `_` directives from device records and
//! resolves each record:
//! 1. Deep merge over `_defaults`
//! 2. `{key}` interpolation of string values
//! 3. Empty-value check against `_null_if_empty`

mod directives;
mod document;
mod merge;
mod store;
mod template;

use std::path::PathBuf;

pub use directives::{
    is_reserved, Directives, DEFAULTS_KEY, DIRECTIVE_PREFIX, NULLABLE_KEYS_KEY, RAW_KEYS_KEY,
    WRAP_KEYS_KEY,
};
pub use document::{NonFiniteKeys, RawDocument, DEFAULT_CONFIG_PATH};
pub use merge::{deep_merge, merge_tables};
pub use store::{ConfigStore, ResolvedConfig};
pub use template::{interpolate, is_template, is_truthy, plain_text, TemplateError};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid directive {directive}: expected {expected}")]
    InvalidDirective { directive: String, expected: String },

    #[error("Invalid configuration. Record {identifier} is not a table")]
    InvalidRecord { identifier: String },

    #[error("Invalid configuration. Key {key} is empty for {identifier}")]
    Validation { key: String, identifier: String },

    #[error("Invalid configuration for {identifier}: {source}")]
    Template {
        identifier: String,
        #[source]
        source: TemplateError,
    },

    #[error("Configuration not found for mac: {0}")]
    NotFound(String),
}
