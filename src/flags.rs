//! Compiler definition flags
//!
//! One `-D<NAME>='<VALUE>'` token per resolved key, consumed by PlatformIO
//! as `build_flags`.

use serde_json::Value;
use std::fmt;

use crate::config::{plain_text, Directives};

/// Value token emitted for keys resolved to null
pub const NULL_TOKEN: &str = "NULL";

/// A single compiler definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub value: String,
}

impl Flag {
    /// Build the flag for one resolved key.
    ///
    /// `literal` marks a string that stands for a non-finite float and is
    /// emitted bare like any other number.
    pub fn new(key: &str, value: &Value, directives: &Directives, literal: bool) -> Self {
        let name = if directives.wrap_keys {
            format!("__{}__", key)
        } else {
            key.to_string()
        };

        let value = match value {
            Value::Null => NULL_TOKEN.to_string(),
            Value::String(s) if !literal && !directives.is_raw(key) => format!("\"{}\"", s),
            other => plain_text(other),
        };

        Self { name, value }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-D{}='{}'", self.name, self.value)
    }
}
