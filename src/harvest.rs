use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::catalogue::{CatalogueClient, listing_items, read_json};
use crate::config::{Endpoint, HarvestConfig};
use crate::dates::{RevisionDates, reconcile};
use crate::domain::{
    DataClass, DataClasses, DataElement, DatasetDates, Revisions, required_str, retain_fields,
};
use crate::error::HarvestError;
use crate::metadata::{MetadataEntry, STRUCTURAL_METADATA, extract_entries, merge_entries};
use crate::pid::PidList;

/// Fields that never survive into a dataset record; dates are replaced by the
/// reconciled `modified`/`issued` pair and classes are attached separately.
const DATASET_DROPPED: &[&str] = &[
    "documentationVersion",
    "lastUpdated",
    "dateFinalised",
    "dataClassesCount",
    "dataClasses",
];

/// A dataset in the flat v1 shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetV1 {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(flatten)]
    pub structure: DataClasses,
}

impl DatasetV1 {
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetCollection<T> {
    pub count: usize,
    #[serde(rename = "dataModels")]
    pub data_models: Vec<T>,
}

impl<T> DatasetCollection<T> {
    pub fn new(data_models: Vec<T>) -> Self {
        Self {
            count: data_models.len(),
            data_models,
        }
    }
}

/// Both output shapes for one dataset. The v2 record is only present when
/// the dataset carries profile metadata.
#[derive(Debug, Clone)]
pub struct AssembledDataset {
    pub v1: DatasetV1,
    pub v2: Option<Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub v1: DatasetCollection<DatasetV1>,
    pub v2: DatasetCollection<Map<String, Value>>,
}

pub struct Harvester<C: CatalogueClient> {
    client: C,
    config: HarvestConfig,
}

impl<C: CatalogueClient> Harvester<C> {
    pub fn new(client: C, config: HarvestConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    fn fetch(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<Value, HarvestError> {
        let url = self.config.endpoints.url(endpoint, params)?;
        self.client.get_json(&url)
    }

    /// Runs a full harvest: every dataset in the catalogue listing, one at a
    /// time.
    pub fn harvest(&self) -> Result<HarvestResult, HarvestError> {
        let listing = self.fetch(Endpoint::DataModels, &[])?;
        let summaries = listing_items(&listing, "data model listing")?;
        info!(datasets = summaries.len(), "processing data models");

        let pids = self.pid_list()?;
        debug!(entries = pids.len(), "loaded pid list");

        let mut v1 = Vec::with_capacity(summaries.len());
        let mut v2 = Vec::new();
        for summary in summaries {
            let assembled = self.assemble(summary, &pids)?;
            v1.push(assembled.v1);
            v2.extend(assembled.v2);
        }

        info!(v1 = v1.len(), v2 = v2.len(), "harvest complete");
        Ok(HarvestResult {
            v1: DatasetCollection::new(v1),
            v2: DatasetCollection::new(v2),
        })
    }

    pub fn pid_list(&self) -> Result<PidList, HarvestError> {
        let raw = match &self.config.pid_list_file {
            Some(path) => read_json(path)?,
            None => self.fetch(Endpoint::PidList, &[])?,
        };
        PidList::from_json(raw)
    }

    pub fn assemble(
        &self,
        summary: &Value,
        pids: &PidList,
    ) -> Result<AssembledDataset, HarvestError> {
        let model_id = required_str(summary, "id", "data model listing item")?;
        info!(%model_id, "processing data model");
        let params = [("model_id", model_id.as_str())];
        let pid = pids.lookup(&model_id);

        let detail = self.fetch(Endpoint::DataModel, &params)?;
        let profile = self.fetch(Endpoint::Profile, &params)?;

        let mut fields = Map::new();
        fields.insert("@schema".to_string(), to_json(&self.config.schema_v1)?);
        if let Some(pid) = pid {
            fields.insert("pid".to_string(), Value::from(pid));
        }
        fields.extend(retain_fields(&detail, DATASET_DROPPED));
        fields.insert(
            "version".to_string(),
            detail.get("documentationVersion").cloned().unwrap_or(Value::Null),
        );
        fields.extend(retain_fields(&profile, DATASET_DROPPED));

        let record_id = fields
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| HarvestError::missing("id", format!("data model {model_id}")))?;

        let revisions = self.get_semantic_links(&model_id)?;
        let dates = self.reconcile_dates(&revisions)?;
        let revisions = to_json(&revisions)?;
        fields.insert("revisions".to_string(), revisions.clone());
        fields.insert("modified".to_string(), to_json(&dates.modified)?);
        fields.insert("issued".to_string(), to_json(&dates.issued)?);

        let mut v2 = Map::new();
        v2.insert("@schema".to_string(), to_json(&self.config.schema_v2)?);
        v2.insert("pid".to_string(), pid.map_or(Value::Null, Value::from));
        v2.insert("id".to_string(), Value::from(record_id.as_str()));
        v2.insert(
            "identifier".to_string(),
            Value::from(
                self.config
                    .dataset_page
                    .render(&[("model_id", model_id.as_str())])?,
            ),
        );
        v2.insert("version".to_string(), field_or_null(&fields, "version"));
        v2.insert(
            "summary".to_string(),
            Value::Object(Map::from_iter([(
                "title".to_string(),
                field_or_null(&fields, "label"),
            )])),
        );
        v2.insert(
            "documentation".to_string(),
            Value::Object(Map::from_iter([(
                "description".to_string(),
                field_or_null(&fields, "description"),
            )])),
        );
        v2.insert("revisions".to_string(), revisions);
        v2.insert("modified".to_string(), to_json(&dates.modified)?);
        v2.insert("issued".to_string(), to_json(&dates.issued)?);

        let metadata = self.get_v2_metadata(&record_id)?;
        merge_entries(&mut v2, &metadata);

        let structure = self.get_data_classes(&model_id)?;
        v2.insert(STRUCTURAL_METADATA.to_string(), to_json(&structure)?);

        Ok(AssembledDataset {
            v1: DatasetV1 { fields, structure },
            v2: (!metadata.is_empty()).then_some(v2),
        })
    }

    pub fn get_data_elements(
        &self,
        model_id: &str,
        class_id: &str,
    ) -> Result<Vec<DataElement>, HarvestError> {
        let listing = self.fetch(
            Endpoint::DataElements,
            &[("model_id", model_id), ("class_id", class_id)],
        )?;
        listing_items(&listing, "data element listing")?
            .iter()
            .map(|item| {
                let element = DataElement::from_api(item)?;
                debug!(id = %element.id, name = ?element.name, "processing data element");
                Ok(element)
            })
            .collect()
    }

    pub fn get_data_classes(&self, model_id: &str) -> Result<DataClasses, HarvestError> {
        let listing = self.fetch(Endpoint::DataClasses, &[("model_id", model_id)])?;
        let count = listing.get("count").and_then(Value::as_u64).unwrap_or(0);
        let mut classes = Vec::new();
        for item in listing_items(&listing, "data class listing")? {
            let class_id = required_str(item, "id", "data class listing item")?;
            debug!(id = %class_id, label = ?item.get("label"), "processing data class");
            let detail = self.fetch(
                Endpoint::DataClass,
                &[("model_id", model_id), ("class_id", class_id.as_str())],
            )?;
            let elements = self.get_data_elements(model_id, &class_id)?;
            classes.push(DataClass::from_api(&class_id, &detail, elements)?);
        }
        Ok(DataClasses { count, classes })
    }

    /// Revision history from semantic links; `latest` always points at
    /// `model_id`.
    pub fn get_semantic_links(&self, model_id: &str) -> Result<Revisions, HarvestError> {
        let listing = self.fetch(Endpoint::SemanticLinks, &[("model_id", model_id)])?;
        let mut revisions = Revisions::default();
        for link in listing_items(&listing, "semantic link listing")? {
            for side in ["source", "target"] {
                let end = link
                    .get(side)
                    .ok_or_else(|| HarvestError::missing(side, "semantic link"))?;
                let context = format!("semantic link {side}");
                revisions.insert(
                    required_str(end, "documentationVersion", &context)?,
                    required_str(end, "id", &context)?,
                );
            }
        }
        revisions.insert(Revisions::LATEST, model_id);
        Ok(revisions)
    }

    pub fn reconcile_dates(&self, revisions: &Revisions) -> Result<DatasetDates, HarvestError> {
        let mut collected = Vec::with_capacity(revisions.len());
        for (version, id) in revisions.iter() {
            debug!(%version, %id, "reading revision dates");
            let record = self.fetch(Endpoint::DataModel, &[("model_id", id)])?;
            collected.push(RevisionDates::from_record(&record)?);
        }
        Ok(reconcile(collected))
    }

    pub fn get_v2_metadata(&self, model_id: &str) -> Result<Vec<MetadataEntry>, HarvestError> {
        let listing = self.fetch(Endpoint::Metadata, &[("model_id", model_id)])?;
        extract_entries(&listing, &self.config.profile_namespace)
    }
}

/// Sets `pid` on every v1 record the pid list knows about.
pub fn apply_pids(collection: &mut DatasetCollection<DatasetV1>, pids: &PidList) {
    for dataset in &mut collection.data_models {
        let Some(pid) = dataset.id().and_then(|id| pids.lookup(id)) else {
            continue;
        };
        let pid = Value::from(pid);
        dataset.fields.insert("pid".to_string(), pid);
    }
}

fn field_or_null(fields: &Map<String, Value>, key: &str) -> Value {
    fields.get(key).cloned().unwrap_or(Value::Null)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, HarvestError> {
    serde_json::to_value(value).map_err(|err| HarvestError::Serialize(err.to_string()))
}
