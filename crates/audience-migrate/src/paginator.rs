//! Page-by-page retrieval of listing endpoints.
//!
//! Pages are requested from index 0 upwards until the server flags a page as
//! `last`. A request that yields no usable page ends the listing early: a
//! transient failure mid-listing is indistinguishable from the end of the data,
//! and whatever was accumulated so far is returned as the result.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::client::RestApi;
use crate::endpoint::{Record, ResourceKind};
use crate::error::{Error, Result};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Query parameters the paginator owns; filters may not redefine them.
const RESERVED_PARAMS: [&str; 2] = ["page", "size"];

/// One listing response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Records on this page, in server order.
    #[serde(default)]
    pub content: Vec<Record>,
    /// Whether this is the final page. A missing or `null` flag means more pages follow.
    #[serde(default, deserialize_with = "nullable_flag")]
    pub last: bool,
}

impl Page {
    /// Decodes a listing response body.
    ///
    /// Only a non-empty JSON object is a usable page. `null`, `{}`, arrays and
    /// scalars all count as "no usable response".
    ///
    /// # Errors
    ///
    /// Returns a decode error for unusable or malformed bodies.
    pub fn decode(body: serde_json::Value) -> Result<Self> {
        match body {
            serde_json::Value::Object(map) if !map.is_empty() => {
                serde_json::from_value(serde_json::Value::Object(map))
                    .map_err(|e| Error::Decode(format!("invalid page: {e}")))
            }
            serde_json::Value::Object(_) | serde_json::Value::Null => {
                Err(Error::Decode("empty page".to_string()))
            }
            other => Err(Error::Decode(format!(
                "expected a page object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn nullable_flag<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::String(_) => "string",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
        serde_json::Value::Null => "null",
    }
}

/// Page size and extra filters applied to a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    size: u32,
    filters: Vec<(String, String)>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            filters: Vec::new(),
        }
    }
}

impl PageRequest {
    /// Creates a request with the given page size.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `size` is zero.
    pub fn with_size(size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::Config(
                "page size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            size,
            filters: Vec::new(),
        })
    }

    /// Adds a resource-specific query filter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `key` is `page` or `size`.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if RESERVED_PARAMS.contains(&key.as_str()) {
            return Err(Error::Config(format!(
                "query filter '{key}' is managed by the paginator"
            )));
        }
        self.filters.push((key, value.into()));
        Ok(self)
    }

    /// Page size.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Extra filters, in insertion order.
    #[must_use]
    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// Query string pairs for page `page`.
    #[must_use]
    pub fn query(&self, page: u32) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 2);
        params.push(("page".to_string(), page.to_string()));
        params.push(("size".to_string(), self.size.to_string()));
        params.extend(self.filters.iter().cloned());
        params
    }
}

/// Fetches every page of the `kind` listing and concatenates their content.
///
/// Never fails: a page that cannot be fetched or decoded ends the listing and
/// the records accumulated so far are returned.
pub async fn fetch_all<A>(api: &A, kind: ResourceKind, request: &PageRequest) -> Vec<Record>
where
    A: RestApi + ?Sized,
{
    let mut records = Vec::new();
    let mut page: u32 = 0;

    loop {
        let current = match api.list_page(kind, page, request).await {
            Ok(current) => current,
            Err(e) => {
                warn!(
                    "Stopping {} listing at page {}: {} ({} records so far)",
                    kind,
                    page,
                    e,
                    records.len()
                );
                break;
            }
        };

        debug!(
            "Fetched {} page {} with {} records (last: {})",
            kind,
            page,
            current.content.len(),
            current.last
        );
        records.extend(current.content);

        if current.last {
            break;
        }
        page += 1;
    }

    info!("Fetched {} {} records from source", records.len(), kind);
    records
}

#[cfg(test)]
#[path = "paginator_tests.rs"]
mod tests;
