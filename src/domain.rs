use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::HarvestError;

const ELEMENT_DROPPED: &[&str] = &[
    "id",
    "domainType",
    "label",
    "breadcrumbs",
    "dataModel",
    "dataClass",
    "dataType",
    "name",
];

const CLASS_DROPPED: &[&str] = &[
    "id",
    "domainType",
    "label",
    "breadcrumbs",
    "dataModel",
    "editable",
    "lastUpdated",
    "name",
    "dataElementsCount",
    "dataElements",
];

/// A single field description inside a data class.
///
/// The catalogue id is kept for table exports but is not part of the
/// serialized dataset record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataElement {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    pub name: Option<String>,
    #[serde(rename = "dataType")]
    pub data_type: String,
}

impl DataElement {
    pub fn from_api(item: &Value) -> Result<Self, HarvestError> {
        let id = required_str(item, "id", "data element")?;
        let data_type = item
            .get("dataType")
            .and_then(|value| value.get("label"))
            .and_then(Value::as_str)
            .ok_or_else(|| HarvestError::missing("dataType.label", format!("data element {id}")))?
            .to_string();
        Ok(Self {
            attributes: retain_fields(item, ELEMENT_DROPPED),
            name: optional_str(item, "label"),
            data_type,
            id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataClass {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    pub name: Option<String>,
    #[serde(rename = "dataElementsCount")]
    pub data_elements_count: usize,
    #[serde(rename = "dataElements")]
    pub data_elements: Vec<DataElement>,
}

impl DataClass {
    /// Builds a class from its detail response and already-extracted elements.
    pub fn from_api(
        id: &str,
        detail: &Value,
        data_elements: Vec<DataElement>,
    ) -> Result<Self, HarvestError> {
        required_str(detail, "id", &format!("data class {id}"))?;
        Ok(Self {
            id: id.to_string(),
            attributes: retain_fields(detail, CLASS_DROPPED),
            name: optional_str(detail, "label"),
            data_elements_count: data_elements.len(),
            data_elements,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataClasses {
    #[serde(rename = "dataClassesCount")]
    pub count: u64,
    #[serde(rename = "dataClasses")]
    pub classes: Vec<DataClass>,
}

/// Version label to dataset id, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revisions {
    entries: Vec<(String, String)>,
}

impl Revisions {
    pub const LATEST: &'static str = "latest";

    pub fn insert(&mut self, version: impl Into<String>, id: impl Into<String>) {
        let version = version.into();
        let id = id.into();
        match self.entries.iter_mut().find(|(key, _)| *key == version) {
            Some(entry) => entry.1 = id,
            None => self.entries.push((version, id)),
        }
    }

    pub fn get(&self, version: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == version)
            .map(|(_, id)| id.as_str())
    }

    pub fn latest(&self) -> Option<&str> {
        self.get(Self::LATEST)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(version, id)| (version.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Revisions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (version, id) in &self.entries {
            map.serialize_entry(version, id)?;
        }
        map.end()
    }
}

/// Reconciled dataset dates, rendered as `%Y-%m-%dT%H:%M:%SZ`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetDates {
    pub modified: Option<String>,
    pub issued: Option<String>,
}

pub fn required_str(value: &Value, field: &str, context: &str) -> Result<String, HarvestError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| HarvestError::missing(field, context))
}

pub fn optional_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Copies every field of `value` except the dropped ones into a new map.
pub fn retain_fields(value: &Value, dropped: &[&str]) -> Map<String, Value> {
    value
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter(|(key, _)| !dropped.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}
