//! `{key}` interpolation of string values
//!
//! Placeholders are substituted in a single pass from the merged,
//! pre-interpolation record. A substituted value is never scanned again, so
//! `{a}` where `a` itself holds a placeholder yields the placeholder text.
//! `{{` and `}}` produce literal braces.

use serde_json::{Map, Value};

/// Template errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown key '{key}' referenced in '{template}'")]
    UnknownKey { key: String, template: String },

    #[error("malformed template '{template}': {reason}")]
    Malformed { template: String, reason: String },
}

/// Whether a value counts as set.
///
/// Empty strings, zero, `false`, empty arrays and empty tables are unset.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Whether a string is subject to interpolation at all
pub fn is_template(s: &str) -> bool {
    s.contains('{') && s.contains('}')
}

/// Plain textual form of a value: strings unquoted, everything else as
/// compact JSON.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute every `{key}` in `template` with the value of `key` in `scope`.
pub fn interpolate(template: &str, scope: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut key = String::new();
                let mut closed = false;
                for k in chars.by_ref() {
                    if k == '}' {
                        closed = true;
                        break;
                    }
                    if k == '{' {
                        return Err(malformed(template, "nested '{' in placeholder"));
                    }
                    key.push(k);
                }
                if !closed {
                    return Err(malformed(template, "unterminated placeholder"));
                }
                if key.is_empty() {
                    return Err(malformed(template, "empty placeholder"));
                }
                let value = scope.get(&key).ok_or_else(|| TemplateError::UnknownKey {
                    key: key.clone(),
                    template: template.to_string(),
                })?;
                out.push_str(&plain_text(value));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(malformed(template, "single '}' encountered")),
            other => out.push(other),
        }
    }

    Ok(out)
}

fn malformed(template: &str, reason: &str) -> TemplateError {
    TemplateError::Malformed {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}
