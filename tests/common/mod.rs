#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Map, Value, json};

use catalogue_harvester::catalogue::CatalogueClient;
use catalogue_harvester::config::{Endpoint, Endpoints, HarvestConfig};
use catalogue_harvester::error::HarvestError;

/// Serves canned JSON by URL. Unknown URLs behave like a 404.
#[derive(Default)]
pub struct FixtureClient {
    responses: HashMap<String, Value>,
    failures: HashMap<String, u16>,
    pub calls: Mutex<Vec<String>>,
}

impl FixtureClient {
    pub fn respond(&mut self, endpoint: Endpoint, params: &[(&str, &str)], body: Value) {
        let url = Endpoints::default().url(endpoint, params).unwrap();
        self.responses.insert(url, body);
    }

    pub fn fail(&mut self, endpoint: Endpoint, params: &[(&str, &str)], status: u16) {
        let url = Endpoints::default().url(endpoint, params).unwrap();
        self.failures.insert(url, status);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CatalogueClient for FixtureClient {
    fn get_json(&self, url: &str) -> Result<Value, HarvestError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(status) = self.failures.get(url) {
            return Err(HarvestError::Status {
                status: *status,
                url: url.to_string(),
                message: "fixture failure".to_string(),
            });
        }
        Ok(self
            .responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }
}

pub fn config() -> HarvestConfig {
    HarvestConfig::default()
}

/// Two datasets: `m-1` is fully described with a prior revision `m-old`;
/// `m-2` has no profile, links, classes or profile metadata.
pub fn catalogue() -> FixtureClient {
    let mut client = FixtureClient::default();

    client.respond(
        Endpoint::DataModels,
        &[],
        json!({"count": 2, "items": [{"id": "m-1", "label": "Cohort A"}, {"id": "m-2"}]}),
    );
    client.respond(
        Endpoint::PidList,
        &[],
        json!({"data": [
            {"pid": "pid-1", "datasetIds": ["m-old", "m-1"]},
            {"pid": "pid-9", "datasetIds": ["unrelated"]}
        ]}),
    );

    let m1 = [("model_id", "m-1")];
    client.respond(
        Endpoint::DataModel,
        &m1,
        json!({
            "id": "m-1",
            "domainType": "DataModel",
            "label": "Cohort A",
            "description": "Longitudinal cohort",
            "author": "Cohort team",
            "documentationVersion": "2.0.0",
            "lastUpdated": "2021-03-01T12:00:00.500Z",
            "dateFinalised": "2021-02-01T00:00:00Z"
        }),
    );
    client.respond(
        Endpoint::Profile,
        &m1,
        json!({"id": "m-1", "publisher": "HDR UK", "lastUpdated": "2021-03-01T12:00:00Z"}),
    );
    client.respond(
        Endpoint::SemanticLinks,
        &m1,
        json!({"count": 1, "items": [{
            "linkType": "Superseded By",
            "source": {"id": "m-old", "documentationVersion": "1.0.0"},
            "target": {"id": "m-1", "documentationVersion": "2.0.0"}
        }]}),
    );
    client.respond(
        Endpoint::DataModel,
        &[("model_id", "m-old")],
        json!({"id": "m-old", "lastUpdated": "2020-01-01T00:00:00Z"}),
    );
    client.respond(
        Endpoint::Metadata,
        &m1,
        json!({"count": 3, "items": [
            {"namespace": "org.healthdatagateway", "key": "properties/summary/keywords", "value": "['cancer', 'cohort']"},
            {"namespace": "org.healthdatagateway", "key": "properties/summary/abstract", "value": "A cohort of patients"},
            {"namespace": "uk.ac.other", "key": "properties/summary/title", "value": "ignored"}
        ]}),
    );
    client.respond(
        Endpoint::DataClasses,
        &m1,
        json!({"count": 1, "items": [{"id": "c-1", "label": "Patients"}]}),
    );
    client.respond(
        Endpoint::DataClass,
        &[("model_id", "m-1"), ("class_id", "c-1")],
        json!({
            "id": "c-1",
            "domainType": "DataClass",
            "label": "Patients",
            "description": "One row per patient",
            "breadcrumbs": [{"id": "m-1"}],
            "dataModel": "m-1",
            "editable": true,
            "lastUpdated": "2021-01-01T00:00:00Z"
        }),
    );
    client.respond(
        Endpoint::DataElements,
        &[("model_id", "m-1"), ("class_id", "c-1")],
        json!({"count": 2, "items": [
            {
                "id": "e-1",
                "domainType": "DataElement",
                "label": "AGE",
                "description": "Age at enrolment",
                "breadcrumbs": [],
                "dataModel": "m-1",
                "dataClass": "c-1",
                "dataType": {"label": "INT", "domainType": "PrimitiveType"}
            },
            {
                "id": "e-2",
                "domainType": "DataElement",
                "label": "SEX",
                "breadcrumbs": [],
                "dataModel": "m-1",
                "dataClass": "c-1",
                "dataType": {"label": "VARCHAR", "domainType": "PrimitiveType"}
            }
        ]}),
    );

    let m2 = [("model_id", "m-2")];
    client.respond(
        Endpoint::DataModel,
        &m2,
        json!({
            "id": "m-2",
            "label": "Registry B",
            "description": "National registry",
            "documentationVersion": "1.0.0"
        }),
    );
    client.respond(
        Endpoint::Metadata,
        &m2,
        json!({"count": 1, "items": [
            {"namespace": "uk.ac.other", "key": "properties/summary/title", "value": "ignored"}
        ]}),
    );

    client
}
