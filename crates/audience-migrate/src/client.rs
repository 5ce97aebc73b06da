//! REST transport for the source and destination APIs.
//!
//! [`RestApi`] is the seam between the pipeline and the network. [`ApiClient`]
//! is the reqwest implementation; tests substitute in-memory implementations.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

use crate::config::ApiEndpoint;
use crate::endpoint::{Record, ResourceKind};
use crate::error::{Error, Result};
use crate::paginator::{json_type_name, Page, PageRequest};

/// Default HTTP timeout for all requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "ApiKey";

/// Header carrying the customer id.
pub const CUSTOMER_ID_HEADER: &str = "CustomerId";

/// Operations the migration needs from one side of the API.
///
/// Every call is a single request. Implementations report failures as errors;
/// deciding whether a failure is fatal is left to the caller.
#[async_trait]
pub trait RestApi: Send + Sync {
    /// Fetches one page of the listing for `kind`.
    async fn list_page(&self, kind: ResourceKind, page: u32, request: &PageRequest)
        -> Result<Page>;

    /// Fetches a single record by identifier.
    async fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Record>;

    /// Creates a record and returns the API's representation of it.
    async fn create(&self, kind: ResourceKind, record: &Record) -> Result<Record>;
}

#[async_trait]
impl<T: RestApi + ?Sized> RestApi for &T {
    async fn list_page(
        &self,
        kind: ResourceKind,
        page: u32,
        request: &PageRequest,
    ) -> Result<Page> {
        (**self).list_page(kind, page, request).await
    }

    async fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Record> {
        (**self).fetch(kind, id).await
    }

    async fn create(&self, kind: ResourceKind, record: &Record) -> Result<Record> {
        (**self).create(kind, record).await
    }
}

/// reqwest-backed [`RestApi`] bound to one endpoint and its credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    endpoint: ApiEndpoint,
    client: Client,
}

impl ApiClient {
    /// Creates a client that sends the endpoint's identity headers on every request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a credential is not a valid header
    /// value, or an HTTP error if the client cannot be built.
    pub fn new(endpoint: ApiEndpoint) -> Result<Self> {
        let headers = identity_headers(&endpoint)?;
        let client = create_http_client(headers)?;
        Ok(Self { endpoint, client })
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<serde_json::Value> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(handle_http_error(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Decode(format!("Response could not be decoded as JSON: {e}"))
        })
    }
}

#[async_trait]
impl RestApi for ApiClient {
    async fn list_page(
        &self,
        kind: ResourceKind,
        page: u32,
        request: &PageRequest,
    ) -> Result<Page> {
        let url = kind.url(&self.endpoint.url);
        debug!("GET {} page={} ({})", url, page, self.endpoint.role);

        let body = self
            .send_json(self.client.get(&url).query(&request.query(page)))
            .await?;
        Page::decode(body)
    }

    async fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Record> {
        let url = kind.record_url(&self.endpoint.url, id);
        debug!("GET {} ({})", url, self.endpoint.role);

        match self.send_json(self.client.get(&url)).await? {
            serde_json::Value::Object(record) => Ok(record),
            other => Err(Error::Decode(format!(
                "expected a {kind} object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    async fn create(&self, kind: ResourceKind, record: &Record) -> Result<Record> {
        let url = kind.url(&self.endpoint.url);
        debug!("POST {} ({})", url, self.endpoint.role);

        match self.send_json(self.client.post(&url).json(record)).await? {
            serde_json::Value::Object(created) => Ok(created),
            other => Err(Error::Decode(format!(
                "expected the created {kind}, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Builds the `ApiKey`, `CustomerId` and `Content-Type` headers for an endpoint.
///
/// # Errors
///
/// Returns a configuration error if a credential contains characters that are
/// not allowed in an HTTP header.
pub fn identity_headers(endpoint: &ApiEndpoint) -> Result<HeaderMap> {
    let value = |field: &str, raw: &str| {
        HeaderValue::from_str(raw).map_err(|_| {
            Error::Config(format!(
                "'{field}' in '{}' section is not a valid header value",
                endpoint.role
            ))
        })
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("apikey"),
        value(API_KEY_HEADER, &endpoint.api_key)?,
    );
    headers.insert(
        HeaderName::from_static("customerid"),
        value(CUSTOMER_ID_HEADER, &endpoint.customer_id)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Creates a configured HTTP client with timeout and default headers.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn create_http_client(headers: HeaderMap) -> Result<Client> {
    Ok(Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .default_headers(headers)
        .build()?)
}

/// Maps a non-success HTTP status to an error.
///
/// Requests are never retried, so rate limiting (429) is reported like any
/// other API error.
pub fn handle_http_error(status_code: u16, body: &str) -> Error {
    match status_code {
        401 | 403 => Error::Authentication(format!("HTTP {status_code}: {body}")),
        _ => Error::Api {
            status: status_code,
            body: body.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
