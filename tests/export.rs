mod common;

use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use serde_json::Value;

use catalogue_harvester::config::{EndpointTemplate, HarvestConfig};
use catalogue_harvester::error::HarvestError;

use catalogue_harvester::export::{
    DATA_CLASSES_CSV, DATA_ELEMENTS_CSV, DATASETS_CSV, DATASETS_JSON, DATASETS_V2_JSON,
    ExportOptions, SITEMAP_TXT, export_all,
};
use catalogue_harvester::harvest::Harvester;

fn read_value(path: &Utf8PathBuf) -> Value {
    let raw = fs::read_to_string(path.as_std_path()).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn exports_counted_collections() {
    let temp = tempfile::tempdir().unwrap();
    let output_dir = Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap();
    let harvester = Harvester::new(common::catalogue(), common::config());
    let result = harvester.harvest().unwrap();

    let options = ExportOptions {
        output_dir: output_dir.clone(),
        ..ExportOptions::default()
    };
    let written = export_all(&result, harvester.config(), &options).unwrap();
    assert_eq!(
        written,
        vec![output_dir.join(DATASETS_JSON), output_dir.join(DATASETS_V2_JSON)]
    );

    let v1 = read_value(&output_dir.join(DATASETS_JSON));
    assert_eq!(v1["count"], 2);
    assert_eq!(v1["dataModels"].as_array().unwrap().len(), 2);

    let v2 = read_value(&output_dir.join(DATASETS_V2_JSON));
    assert!(v2["count"].as_u64().unwrap() <= 2);
    assert_eq!(v2["count"], 1);

    assert!(!output_dir.join(DATASETS_CSV).as_std_path().exists());
    assert!(!output_dir.join(SITEMAP_TXT).as_std_path().exists());
}

#[test]
fn exported_json_round_trips() {
    let temp = tempfile::tempdir().unwrap();
    let output_dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let harvester = Harvester::new(common::catalogue(), common::config());
    let result = harvester.harvest().unwrap();

    let options = ExportOptions {
        output_dir: output_dir.clone(),
        ..ExportOptions::default()
    };
    export_all(&result, harvester.config(), &options).unwrap();

    assert_eq!(
        read_value(&output_dir.join(DATASETS_JSON)),
        serde_json::to_value(&result.v1).unwrap()
    );
    assert_eq!(
        read_value(&output_dir.join(DATASETS_V2_JSON)),
        serde_json::to_value(&result.v2).unwrap()
    );

    let raw = fs::read_to_string(output_dir.join(DATASETS_JSON).as_std_path()).unwrap();
    assert!(raw.starts_with("{\n  \"count\": 2,\n  \"dataModels\": ["));
}

#[test]
fn optional_tables_and_sitemap() {
    let temp = tempfile::tempdir().unwrap();
    let output_dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let harvester = Harvester::new(common::catalogue(), common::config());
    let result = harvester.harvest().unwrap();

    let options = ExportOptions {
        output_dir: output_dir.clone(),
        csv: true,
        sitemap: true,
    };
    let written = export_all(&result, harvester.config(), &options).unwrap();
    assert_eq!(written.len(), 6);

    let datasets = fs::read_to_string(output_dir.join(DATASETS_CSV).as_std_path()).unwrap();
    assert_eq!(datasets.lines().count(), 3);
    assert!(datasets.lines().nth(1).unwrap().starts_with("m-1,pid-1,Cohort A,2.0.0,"));
    assert!(datasets.lines().nth(1).unwrap().ends_with(",1,c-1"));

    let classes = fs::read_to_string(output_dir.join(DATA_CLASSES_CSV).as_std_path()).unwrap();
    assert_eq!(
        classes.lines().nth(1),
        Some("c-1,m-1,Patients,One row per patient,2,\"e-1, e-2\"")
    );

    let elements = fs::read_to_string(output_dir.join(DATA_ELEMENTS_CSV).as_std_path()).unwrap();
    assert_eq!(elements.lines().count(), 3);
    assert_eq!(elements.lines().nth(2), Some("e-2,m-1,c-1,SEX,,VARCHAR"));

    let sitemap = fs::read_to_string(output_dir.join(SITEMAP_TXT).as_std_path()).unwrap();
    let lines: Vec<_> = sitemap.lines().collect();
    assert_eq!(lines[0], "https://www.healthdatagateway.org/");
    assert_eq!(lines.len(), 1 + 9 + 2);
    assert_eq!(
        lines[lines.len() - 1],
        "https://web.www.healthdatagateway.org/dataset/m-2"
    );
}

#[test]
fn failed_render_writes_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let output_dir = Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap();
    let harvester = Harvester::new(common::catalogue(), common::config());
    let result = harvester.harvest().unwrap();

    let config = HarvestConfig {
        dataset_page: EndpointTemplate::new("https://example.org/{model_id}/{section}"),
        ..HarvestConfig::default()
    };
    let options = ExportOptions {
        output_dir: output_dir.clone(),
        csv: true,
        sitemap: true,
    };
    let err = export_all(&result, &config, &options).unwrap_err();
    assert_matches!(err, HarvestError::UnboundPlaceholder { ref placeholder, .. } if placeholder == "section");

    assert!(!output_dir.join(DATASETS_JSON).as_std_path().exists());
    assert!(!output_dir.join(DATASETS_V2_JSON).as_std_path().exists());
    assert!(!output_dir.join(DATASETS_CSV).as_std_path().exists());
}
