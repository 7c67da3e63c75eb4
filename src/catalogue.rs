use std::fs;
use std::path::Path;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::HarvestError;

/// Source of JSON documents addressed by URL.
///
/// Unauthorized and not-found responses come back as an empty object; every
/// other non-success status is an error.
pub trait CatalogueClient {
    fn get_json(&self, url: &str) -> Result<Value, HarvestError>;
}

#[derive(Clone)]
pub struct CatalogueHttpClient {
    client: Client,
}

impl CatalogueHttpClient {
    pub fn new() -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("catalogue-harvester/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| HarvestError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| HarvestError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<Option<reqwest::blocking::Response>, HarvestError> {
        let status = response.status();
        match status_outcome(status) {
            StatusOutcome::Data => Ok(Some(response)),
            StatusOutcome::NoData => {
                debug!(%url, status = status.as_u16(), "no data");
                Ok(None)
            }
            StatusOutcome::Fatal => {
                let message = response
                    .text()
                    .unwrap_or_else(|_| "catalogue request failed".to_string());
                Err(HarvestError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                    message,
                })
            }
        }
    }
}

/// How a response status is treated by the fetch helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Data,
    /// Unauthorized or not found: read as an empty object.
    NoData,
    Fatal,
}

pub fn status_outcome(status: StatusCode) -> StatusOutcome {
    if status.is_success() {
        StatusOutcome::Data
    } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND) {
        StatusOutcome::NoData
    } else {
        StatusOutcome::Fatal
    }
}

impl CatalogueClient for CatalogueHttpClient {
    fn get_json(&self, url: &str) -> Result<Value, HarvestError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| HarvestError::Http(err.to_string()))?;
        let Some(response) = Self::handle_status(url, response)? else {
            return Ok(Value::Object(Map::new()));
        };
        let body = response
            .text()
            .map_err(|err| HarvestError::Http(err.to_string()))?;
        parse_body(url, &body)
    }
}

pub fn parse_body(url: &str, body: &str) -> Result<Value, HarvestError> {
    serde_json::from_str(body).map_err(|err| HarvestError::InvalidJson {
        url: url.to_string(),
        message: err.to_string(),
    })
}

pub fn read_json(path: &Path) -> Result<Value, HarvestError> {
    let content = fs::read_to_string(path)
        .map_err(|err| HarvestError::Filesystem(format!("read {}: {err}", path.display())))?;
    parse_body(&path.display().to_string(), &content)
}

/// Items of a `{count, items}` listing. A missing or zero count is an empty
/// listing; a positive count without `items` is an error.
pub fn listing_items<'a>(listing: &'a Value, context: &str) -> Result<&'a [Value], HarvestError> {
    let count = listing.get("count").and_then(Value::as_u64).unwrap_or(0);
    if count == 0 {
        return Ok(&[]);
    }
    listing
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| HarvestError::missing("items", context))
}
