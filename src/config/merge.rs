//! Deep merge of a device record over the `_defaults` table
//!
//! - Tables: deep-merge by key
//! - Arrays: REPLACE (record wins)
//! - Scalars: override (record wins)

use serde_json::{Map, Value};

/// Deep merge `overlay` on top of `base`.
///
/// Keys present only in `base` are retained. When both sides hold a table
/// at the same key the tables are merged recursively, otherwise the overlay
/// value replaces the base value. Key order follows `base`, with keys new
/// to `base` appended in overlay order.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_tables(base_map, overlay_map))
        }

        // Arrays and scalars: overlay wins
        (_, overlay) => overlay,
    }
}

/// Table form of [`deep_merge`], used for whole device records.
pub fn merge_tables(
    mut base: Map<String, Value>,
    overlay: Map<String, Value>,
) -> Map<String, Value> {
    for (key, overlay_value) in overlay {
        let merged = match base.get_mut(&key) {
            Some(base_value) => deep_merge(base_value.take(), overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged);
    }
    base
}
