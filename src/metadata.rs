use serde_json::{Map, Value};
use tracing::warn;

use crate::catalogue::listing_items;
use crate::domain::required_str;
use crate::error::HarvestError;
use crate::literal::{looks_like_list, parse_list_literal};

pub const STRUCTURAL_METADATA: &str = "structuralMetadata";

const PROPERTIES_PREFIX: &str = "properties/";

/// One profile metadata value and the nested-object path it belongs at.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub path: Vec<String>,
    pub value: Value,
}

/// Maps a metadata key to its nested path.
///
/// `properties/summary/title` becomes `["summary", "title"]`. Only the text
/// between the first `properties/` and the next one is used. Keys without a
/// `properties/` segment are split as they are.
pub fn key_path(key: &str) -> Vec<String> {
    if key == STRUCTURAL_METADATA {
        return vec![key.to_string()];
    }
    let remainder = key.split(PROPERTIES_PREFIX).nth(1).unwrap_or(key);
    remainder.split('/').map(str::to_string).collect()
}

/// Extracts path/value pairs for items in `namespace` from a metadata listing.
pub fn extract_entries(listing: &Value, namespace: &str) -> Result<Vec<MetadataEntry>, HarvestError> {
    let mut entries = Vec::new();
    for item in listing_items(listing, "profile metadata")? {
        let item_namespace = required_str(item, "namespace", "profile metadata item")?;
        if item_namespace != namespace {
            continue;
        }
        let key = required_str(item, "key", "profile metadata item")?;
        let value = item
            .get("value")
            .ok_or_else(|| HarvestError::missing("value", format!("profile metadata {key}")))?;
        entries.push(MetadataEntry {
            path: key_path(&key),
            value: decode_value(&key, value),
        });
    }
    Ok(entries)
}

fn decode_value(key: &str, value: &Value) -> Value {
    let Value::String(raw) = value else {
        return value.clone();
    };
    if !looks_like_list(raw) {
        return value.clone();
    }
    match parse_list_literal(raw) {
        Some(list) => list,
        None => {
            warn!(%key, value = %raw, "list-like metadata value did not parse; keeping text");
            value.clone()
        }
    }
}

/// Assigns `value` at `path` inside `target`, creating intermediate objects.
/// A non-object found on the way is replaced by an object.
pub fn nested_set(target: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = target;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        current = map;
    }
    current.insert(last.clone(), value);
}

/// Applies every entry in order; later entries win at the same path.
pub fn merge_entries(target: &mut Map<String, Value>, entries: &[MetadataEntry]) {
    for entry in entries {
        nested_set(target, &entry.path, entry.value.clone());
    }
}
