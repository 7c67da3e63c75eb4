use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

pub const DEFAULT_CONFIG_FILE: &str = "harvest.json";

const API_BASE_URL: &str = "https://metadata-catalogue.org/hdruk/api";

/// A URL containing `{name}` placeholders, bound at request time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, params: &[(&str, &str)]) -> Result<String, HarvestError> {
        let mut url = self.0.clone();
        for (name, value) in params {
            url = url.replace(&format!("{{{name}}}"), value);
        }
        if let Some(captures) = placeholder_regex().captures(&url) {
            return Err(HarvestError::UnboundPlaceholder {
                placeholder: captures[1].to_string(),
                template: self.0.clone(),
            });
        }
        Ok(url)
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z_]+)\}").expect("valid placeholder regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    DataModels,
    DataModel,
    Profile,
    Metadata,
    DataClasses,
    DataClass,
    DataElements,
    SemanticLinks,
    PidList,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Endpoints {
    pub data_models: EndpointTemplate,
    pub data_model: EndpointTemplate,
    pub profile: EndpointTemplate,
    pub metadata: EndpointTemplate,
    pub data_classes: EndpointTemplate,
    pub data_class: EndpointTemplate,
    pub data_elements: EndpointTemplate,
    pub semantic_links: EndpointTemplate,
    pub pid_list: EndpointTemplate,
}

impl Default for Endpoints {
    fn default() -> Self {
        let api = |path: &str| EndpointTemplate::new(format!("{API_BASE_URL}{path}"));
        Self {
            data_models: api("/dataModels"),
            data_model: api("/dataModels/{model_id}"),
            profile: api(
                "/facets/{model_id}/profile/uk.ac.hdrukgateway/HdrUkProfilePluginService",
            ),
            metadata: api("/facets/{model_id}/metadata?all=true"),
            data_classes: api("/dataModels/{model_id}/dataClasses"),
            data_class: api("/dataModels/{model_id}/dataClasses/{class_id}"),
            data_elements: api(
                "/dataModels/{model_id}/dataClasses/{class_id}/dataElements?all=true",
            ),
            semantic_links: api("/catalogueItems/{model_id}/semanticLinks"),
            pid_list: EndpointTemplate::new(
                "https://api.www.healthdatagateway.org/api/v1/datasets/pidList",
            ),
        }
    }
}

impl Endpoints {
    pub fn template(&self, endpoint: Endpoint) -> &EndpointTemplate {
        match endpoint {
            Endpoint::DataModels => &self.data_models,
            Endpoint::DataModel => &self.data_model,
            Endpoint::Profile => &self.profile,
            Endpoint::Metadata => &self.metadata,
            Endpoint::DataClasses => &self.data_classes,
            Endpoint::DataClass => &self.data_class,
            Endpoint::DataElements => &self.data_elements,
            Endpoint::SemanticLinks => &self.semantic_links,
            Endpoint::PidList => &self.pid_list,
        }
    }

    pub fn url(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<String, HarvestError> {
        self.template(endpoint).render(params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaStamp {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub url: String,
}

impl SchemaStamp {
    pub fn dataset_v1() -> Self {
        Self {
            kind: "Dataset".to_string(),
            version: "1.1.7".to_string(),
            url: "https://raw.githubusercontent.com/HDRUK/schemata/develop/schema/dataset/1.1.7/dataset.schema.json".to_string(),
        }
    }

    pub fn dataset_v2() -> Self {
        Self {
            kind: "Dataset".to_string(),
            version: "2.0.0".to_string(),
            url: "https://raw.githubusercontent.com/HDRUK/schemata/develop/schema/dataset/latest/dataset.schema.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub base_url: String,
    pub pages: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        let pages = [
            "pages/about",
            "pages/community",
            "pages/cookie-notice",
            "covid-19",
            "pages/frequently-asked-questions",
            "pages/guidelines",
            "pages/key-terms-glossary",
            "pages/latest-news",
            "pages/metadata-quality",
        ];
        Self {
            base_url: "https://www.healthdatagateway.org/".to_string(),
            pages: pages
                .iter()
                .map(|page| format!("https://www.healthdatagateway.org/{page}"))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub endpoints: Endpoints,
    pub profile_namespace: String,
    pub dataset_page: EndpointTemplate,
    pub schema_v1: SchemaStamp,
    pub schema_v2: SchemaStamp,
    pub pid_list_file: Option<PathBuf>,
    pub sitemap: SitemapConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            profile_namespace: "org.healthdatagateway".to_string(),
            dataset_page: EndpointTemplate::new(
                "https://web.www.healthdatagateway.org/dataset/{model_id}",
            ),
            schema_v1: SchemaStamp::dataset_v1(),
            schema_v2: SchemaStamp::dataset_v2(),
            pid_list_file: None,
            sitemap: SitemapConfig::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads an explicit config file, or `harvest.json` when present, or the
    /// compiled-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<HarvestConfig, HarvestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(HarvestError::MissingConfig(config_path));
            }
            return Ok(HarvestConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarvestError::ConfigRead(config_path.clone()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<HarvestConfig, HarvestError> {
        serde_json::from_str(content).map_err(|err| HarvestError::ConfigParse(err.to_string()))
    }
}
