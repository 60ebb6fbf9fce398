//! Typed client for one REST resource collection

use crate::client::cache_buster::CacheBuster;
use crate::client::transport::{
    ApiRequest, ApiResponse, MERGE_PATCH_CONTENT_TYPE, Method, TOTAL_COUNT_HEADER, Transport,
};
use crate::core::clean::clean_record;
use crate::core::entity::Record;
use crate::core::error::{ClientError, ClientResult, Problem};
use crate::core::query::{CACHE_BUSTER_PARAM, Criteria, QueryParams, RecordFilter, list_query};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// One page of a list response
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Records in server order
    pub items: Vec<R>,
    /// Total across all pages, from `x-total-count`
    pub total_items: u64,
}

/// Issues the REST calls for record type `R`
///
/// The client is stateless apart from the shared cache buster: it turns
/// operations into [`ApiRequest`]s, cleans outbound bodies and maps
/// responses back into records or [`ClientError`]s.
pub struct ResourceClient<R> {
    transport: Arc<dyn Transport>,
    cache_buster: Arc<CacheBuster>,
    path: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            cache_buster: self.cache_buster.clone(),
            path: self.path.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> ResourceClient<R> {
    /// Create a client rooted at `api_prefix` (usually `/api`)
    pub fn new(
        transport: Arc<dyn Transport>,
        cache_buster: Arc<CacheBuster>,
        api_prefix: &str,
    ) -> Self {
        let prefix = api_prefix.trim_end_matches('/');
        Self {
            transport,
            cache_buster,
            path: format!("{}/{}", prefix, R::resource_name()),
            _record: PhantomData,
        }
    }

    /// Collection path, e.g. `/api/incidents`
    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Build the GET request for a (possibly filtered) page
    pub fn list_request(&self, params: &QueryParams, criteria: &Criteria) -> ApiRequest {
        let query = list_query(params, criteria, self.cache_buster.next_token());
        ApiRequest::new(Method::Get, self.path.clone()).with_query(query)
    }

    /// Fetch a page without predicates
    pub async fn list(&self, params: &QueryParams) -> ClientResult<Page<R>> {
        self.fetch_page(self.list_request(params, &Criteria::new()))
            .await
    }

    /// Fetch a page matching the filter's predicates
    pub async fn list_filtered(
        &self,
        params: &QueryParams,
        filter: &R::Filter,
    ) -> ClientResult<Page<R>> {
        self.fetch_page(self.list_request(params, &filter.criteria()))
            .await
    }

    async fn fetch_page(&self, request: ApiRequest) -> ClientResult<Page<R>> {
        let response = self.send(request).await?;
        let total_items = parse_total_count(&response)?;
        let items = decode_body::<Vec<R>>(response.body)?;
        Ok(Page { items, total_items })
    }

    /// Count records matching the filter
    pub async fn count(&self, filter: &R::Filter) -> ClientResult<u64> {
        let mut query = filter.criteria().to_pairs();
        query.push((
            CACHE_BUSTER_PARAM.to_string(),
            self.cache_buster.next_token().to_string(),
        ));
        let request =
            ApiRequest::new(Method::Get, format!("{}/count", self.path)).with_query(query);
        let response = self.send(request).await?;
        decode_body::<u64>(response.body)
    }

    /// Fetch one record by id
    pub async fn get(&self, id: i64) -> ClientResult<R> {
        let response = self
            .send(ApiRequest::new(Method::Get, self.item_path(id)))
            .await?;
        decode_body(response.body)
    }

    /// Create a record; the backend assigns its id
    pub async fn create(&self, record: &R) -> ClientResult<R> {
        let request = ApiRequest::new(Method::Post, self.path.clone())
            .with_body(clean_record(record)?);
        let response = self.send(request).await?;
        decode_body(response.body)
    }

    /// Replace a record
    pub async fn update(&self, record: &R) -> ClientResult<R> {
        let id = require_id(record, "update")?;
        let request = ApiRequest::new(Method::Put, self.item_path(id))
            .with_body(clean_record(record)?);
        let response = self.send(request).await?;
        decode_body(response.body)
    }

    /// Merge the set fields of `record` into the stored one
    pub async fn partial_update(&self, record: &R) -> ClientResult<R> {
        let id = require_id(record, "partially update")?;
        let request = ApiRequest::new(Method::Patch, self.item_path(id))
            .with_body(clean_record(record)?)
            .with_content_type(MERGE_PATCH_CONTENT_TYPE);
        let response = self.send(request).await?;
        decode_body(response.body)
    }

    /// Delete a record by id
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.send(ApiRequest::new(Method::Delete, self.item_path(id)))
            .await?;
        Ok(())
    }

    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            "Sending request"
        );
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(status_error(&response))
        }
    }
}

/// Identifier of a record that must already exist
pub fn require_id<R: Record>(record: &R, operation: &'static str) -> ClientResult<i64> {
    record.id().ok_or_else(|| ClientError::MissingId {
        resource: R::resource_name_singular().to_string(),
        operation,
    })
}

/// Parse the `x-total-count` header of a list response
///
/// A missing or non-numeric header is a malformed response; it is never
/// treated as zero.
pub fn parse_total_count(response: &ApiResponse) -> ClientResult<u64> {
    let raw = response.header(TOTAL_COUNT_HEADER).ok_or_else(|| {
        ClientError::malformed(format!("missing {} header", TOTAL_COUNT_HEADER))
    })?;

    raw.trim().parse::<u64>().map_err(|_| {
        ClientError::malformed(format!(
            "{} header is not an integer: '{}'",
            TOTAL_COUNT_HEADER, raw
        ))
    })
}

fn decode_body<T: DeserializeOwned>(body: Option<Value>) -> ClientResult<T> {
    let body = body.ok_or_else(|| ClientError::malformed("empty response body"))?;
    serde_json::from_value(body).map_err(|e| ClientError::malformed(e.to_string()))
}

/// Map a non-2xx response to a server error
fn status_error(response: &ApiResponse) -> ClientError {
    let from_body = match &response.body {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(body) => serde_json::from_value::<Problem>(body.clone())
            .ok()
            .and_then(|p| p.best_message().map(str::to_string)),
        None => None,
    };

    let message = from_body.unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(response.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string()
    });

    ClientError::Server {
        status: response.status,
        message,
    }
}
