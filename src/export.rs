use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::{Map, Value};
use tempfile::Builder;

use crate::config::{EndpointTemplate, HarvestConfig, SitemapConfig};
use crate::domain::{DataClass, DataElement};
use crate::error::HarvestError;
use crate::harvest::{DatasetV1, HarvestResult};

pub const DATASETS_JSON: &str = "datasets.json";
pub const DATASETS_V2_JSON: &str = "datasets.v2.json";
pub const DATASETS_CSV: &str = "datasets.csv";
pub const DATA_CLASSES_CSV: &str = "dataclasses.csv";
pub const DATA_ELEMENTS_CSV: &str = "dataelements.csv";
pub const SITEMAP_TXT: &str = "sitemap.txt";

const DATASET_COLUMNS: &[&str] = &[
    "id",
    "pid",
    "label",
    "version",
    "description",
    "author",
    "publisher",
    "modified",
    "issued",
    "dataClassesCount",
    "dataClasses",
];

const DATA_CLASS_COLUMNS: &[&str] = &[
    "id",
    "dataModel",
    "name",
    "description",
    "dataElementsCount",
    "dataElements",
];

const DATA_ELEMENT_COLUMNS: &[&str] = &[
    "id",
    "dataModel",
    "dataClass",
    "name",
    "description",
    "dataType",
];

/// Writes `content` next to `path` first and renames it into place.
pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), HarvestError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    let mut temp = Builder::new()
        .prefix(".harvest")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| HarvestError::Filesystem(format!("write {path}: {}", err.error)))?;
    Ok(())
}

/// Serializes with two-space indentation.
pub fn json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HarvestError> {
    serde_json::to_vec_pretty(value).map_err(|err| HarvestError::Serialize(err.to_string()))
}

pub fn export_json<T: Serialize>(value: &T, path: &Utf8Path) -> Result<(), HarvestError> {
    write_atomic(path, &json_bytes(value)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    fn new(headers: &'static [&'static str]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, HarvestError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.headers)
            .map_err(|err| HarvestError::Csv(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| HarvestError::Csv(err.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|err| HarvestError::Csv(err.to_string()))
    }
}

/// Datasets, classes and elements flattened into three independent tables.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTables {
    pub datasets: CsvTable,
    pub data_classes: CsvTable,
    pub data_elements: CsvTable,
}

impl CsvTables {
    pub fn from_datasets(datasets: &[DatasetV1]) -> Self {
        let mut tables = Self {
            datasets: CsvTable::new(DATASET_COLUMNS),
            data_classes: CsvTable::new(DATA_CLASS_COLUMNS),
            data_elements: CsvTable::new(DATA_ELEMENT_COLUMNS),
        };
        for dataset in datasets {
            let model_id = dataset.id().unwrap_or_default();
            for class in &dataset.structure.classes {
                for element in &class.data_elements {
                    tables
                        .data_elements
                        .rows
                        .push(element_row(model_id, &class.id, element));
                }
                tables.data_classes.rows.push(class_row(model_id, class));
            }
            tables.datasets.rows.push(dataset_row(dataset));
        }
        tables
    }

    /// Encodes the three tables with their target paths under `output_dir`.
    pub fn render(
        &self,
        output_dir: &Utf8Path,
    ) -> Result<Vec<(Utf8PathBuf, Vec<u8>)>, HarvestError> {
        [
            (DATASETS_CSV, &self.datasets),
            (DATA_CLASSES_CSV, &self.data_classes),
            (DATA_ELEMENTS_CSV, &self.data_elements),
        ]
        .into_iter()
        .map(|(name, table)| Ok((output_dir.join(name), table.to_bytes()?)))
        .collect()
    }
}

fn dataset_row(dataset: &DatasetV1) -> Vec<String> {
    DATASET_COLUMNS
        .iter()
        .map(|column| match *column {
            "dataClassesCount" => dataset.structure.count.to_string(),
            "dataClasses" => join_ids(dataset.structure.classes.iter().map(|class| &class.id)),
            key => cell(&dataset.fields, key),
        })
        .collect()
}

fn class_row(model_id: &str, class: &DataClass) -> Vec<String> {
    DATA_CLASS_COLUMNS
        .iter()
        .map(|column| match *column {
            "id" => class.id.clone(),
            "dataModel" => model_id.to_string(),
            "name" => class.name.clone().unwrap_or_default(),
            "dataElementsCount" => class.data_elements_count.to_string(),
            "dataElements" => join_ids(class.data_elements.iter().map(|element| &element.id)),
            key => cell(&class.attributes, key),
        })
        .collect()
}

fn element_row(model_id: &str, class_id: &str, element: &DataElement) -> Vec<String> {
    DATA_ELEMENT_COLUMNS
        .iter()
        .map(|column| match *column {
            "id" => element.id.clone(),
            "dataModel" => model_id.to_string(),
            "dataClass" => class_id.to_string(),
            "name" => element.name.clone().unwrap_or_default(),
            "dataType" => element.data_type.clone(),
            key => cell(&element.attributes, key),
        })
        .collect()
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a String>) -> String {
    ids.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn cell(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Base URL, then the static pages, then one page per dataset.
pub fn render_sitemap<'a>(
    sitemap: &SitemapConfig,
    dataset_page: &EndpointTemplate,
    dataset_ids: impl IntoIterator<Item = &'a str>,
) -> Result<String, HarvestError> {
    let mut pages = sitemap.pages.clone();
    for id in dataset_ids {
        pages.push(dataset_page.render(&[("model_id", id)])?);
    }
    Ok(format!("{}\n{}", sitemap.base_url, pages.join("\n")))
}

pub fn export_sitemap<'a>(
    sitemap: &SitemapConfig,
    dataset_page: &EndpointTemplate,
    dataset_ids: impl IntoIterator<Item = &'a str>,
    path: &Utf8Path,
) -> Result<(), HarvestError> {
    let content = render_sitemap(sitemap, dataset_page, dataset_ids)?;
    write_atomic(path, content.as_bytes())
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: Utf8PathBuf,
    pub csv: bool,
    pub sitemap: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("."),
            csv: false,
            sitemap: false,
        }
    }
}

/// Writes both JSON collections, plus the optional tables and sitemap.
/// Every file is encoded before the first one is written, so an encoding
/// failure leaves the output directory untouched. Returns the paths written,
/// in order.
pub fn export_all(
    result: &HarvestResult,
    config: &HarvestConfig,
    options: &ExportOptions,
) -> Result<Vec<Utf8PathBuf>, HarvestError> {
    let output_dir = &options.output_dir;
    let mut outputs = vec![
        (output_dir.join(DATASETS_JSON), json_bytes(&result.v1)?),
        (output_dir.join(DATASETS_V2_JSON), json_bytes(&result.v2)?),
    ];

    if options.csv {
        let tables = CsvTables::from_datasets(&result.v1.data_models);
        outputs.extend(tables.render(output_dir)?);
    }

    if options.sitemap {
        let content = render_sitemap(
            &config.sitemap,
            &config.dataset_page,
            result.v1.data_models.iter().filter_map(DatasetV1::id),
        )?;
        outputs.push((output_dir.join(SITEMAP_TXT), content.into_bytes()));
    }

    let mut written = Vec::with_capacity(outputs.len());
    for (path, content) in outputs {
        write_atomic(&path, &content)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::DataClasses;

    fn dataset() -> DatasetV1 {
        let element = DataElement::from_api(&json!({
            "id": "e-1",
            "label": "AGE",
            "description": "Age, in years",
            "dataType": {"label": "INT"}
        }))
        .unwrap();
        let class = DataClass::from_api(
            "c-1",
            &json!({"id": "c-1", "label": "Patients"}),
            vec![element],
        )
        .unwrap();
        let fields = json!({
            "id": "m-1",
            "label": "Cohort",
            "publisher": {"name": "NHS"},
            "modified": null
        });
        DatasetV1 {
            fields: fields.as_object().cloned().unwrap(),
            structure: DataClasses {
                count: 1,
                classes: vec![class],
            },
        }
    }

    #[test]
    fn tables_use_declared_columns_and_joined_ids() {
        let tables = CsvTables::from_datasets(&[dataset()]);

        assert_eq!(tables.datasets.headers, DATASET_COLUMNS);
        let row = &tables.datasets.rows[0];
        assert_eq!(row[0], "m-1");
        assert_eq!(row[2], "Cohort");
        assert_eq!(row[6], r#"{"name":"NHS"}"#);
        assert_eq!(row[7], "");
        assert_eq!(row[10], "c-1");

        assert_eq!(
            tables.data_classes.rows[0],
            vec!["c-1", "m-1", "Patients", "", "1", "e-1"]
        );
        assert_eq!(
            tables.data_elements.rows[0],
            vec!["e-1", "m-1", "c-1", "AGE", "Age, in years", "INT"]
        );
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let tables = CsvTables::from_datasets(&[dataset()]);
        let text = String::from_utf8(tables.data_elements.to_bytes().unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,dataModel,dataClass,name,description,dataType"));
        assert_eq!(lines.next(), Some("e-1,m-1,c-1,AGE,\"Age, in years\",INT"));
    }

    #[test]
    fn sitemap_lists_pages_then_datasets() {
        let sitemap = SitemapConfig {
            base_url: "https://example.org/".to_string(),
            pages: vec!["https://example.org/about".to_string()],
        };
        let page = EndpointTemplate::new("https://example.org/dataset/{model_id}");
        let text = render_sitemap(&sitemap, &page, ["a", "b"]).unwrap();
        assert_eq!(
            text,
            "https://example.org/\nhttps://example.org/about\nhttps://example.org/dataset/a\nhttps://example.org/dataset/b"
        );
    }
}
