use std::time::Instant;

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::data_models::{Hit, Pagination, SearchOutcome, SearchRequest, SearchResponse};
use crate::error::{DecodeError, Result, SearchError};
use crate::query::OPERATION_NAME;
use crate::wire::{self, RawResult};

/// Stateless adapter over the gateway's `Search` operation.
///
/// Cloning is cheap and clones share the connection pool, so one client can
/// serve concurrent callers.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl SearchClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            SearchError::validation(format!("invalid gateway url {:?}: {e}", config.endpoint))
        })?;
        let headers = build_headers(&config)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// Client configured from `SCOUT_*` environment variables (and `.env`).
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Runs every request in one round trip.
    ///
    /// The returned vector is as long as `requests` and in the same order.
    /// A result the gateway sent in an unexpected shape shows up as a
    /// [`DecodeError`] at its position without affecting its neighbours.
    pub async fn search(&self, requests: &[SearchRequest]) -> Result<Vec<SearchOutcome>> {
        validate(requests)?;
        let body = wire::encode_batch(requests);

        debug!(
            endpoint = %self.endpoint,
            operation = OPERATION_NAME,
            requests = requests.len(),
            "sending search batch"
        );
        let started = Instant::now();
        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&[("opname", OPERATION_NAME)])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        info!(
            status = status.as_u16(),
            bytes = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "gateway responded"
        );

        decode_body(status, &text, requests)
    }
}

fn build_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value(&config.user_agent)?);
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SearchError::validation(format!("invalid header name {name:?}: {e}")))?;
        headers.insert(name, header_value(value)?);
    }
    if let Some(cookie) = &config.cookie {
        headers.insert(COOKIE, header_value(cookie)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| SearchError::validation(format!("invalid header value {value:?}: {e}")))
}

fn validate(requests: &[SearchRequest]) -> Result<()> {
    if requests.is_empty() {
        return Err(SearchError::validation("at least one search request is required"));
    }
    for (index, request) in requests.iter().enumerate() {
        request.validate(index)?;
    }
    Ok(())
}

/// Turns a gateway reply into per-request outcomes.
pub(crate) fn decode_body(
    status: StatusCode,
    body: &str,
    requests: &[SearchRequest],
) -> Result<Vec<SearchOutcome>> {
    let envelope = match serde_json::from_str::<Value>(body) {
        Ok(value) => wire::unwrap_batch(value),
        Err(e) if status.is_success() => {
            return Err(SearchError::transport(
                format!("gateway response is not JSON: {e}"),
                Some(status.as_u16()),
            ));
        }
        Err(_) => return Err(http_failure(status)),
    };

    let errors = wire::graphql_errors(&envelope);
    if !errors.is_empty() {
        warn!(count = errors.len(), "gateway reported GraphQL errors");
        return Err(SearchError::GraphQL(errors));
    }
    if !status.is_success() {
        return Err(http_failure(status));
    }

    let results = wire::search_results(&envelope);
    let received = results.map_or(0, Vec::len);
    if received > requests.len() {
        warn!(
            expected = requests.len(),
            received, "gateway returned more results than requested, extras ignored"
        );
    }

    let outcomes = requests
        .iter()
        .enumerate()
        .map(|(index, request)| match results.and_then(|r| r.get(index)) {
            Some(raw) => decode_result(index, raw, request),
            None => Err(DecodeError::new(index, "gateway returned no result for this request")),
        })
        .collect::<Vec<_>>();

    for err in outcomes.iter().filter_map(|o| o.as_ref().err()) {
        warn!("{err}");
    }
    Ok(outcomes)
}

fn decode_result(index: usize, raw: &Value, request: &SearchRequest) -> SearchOutcome {
    let raw: RawResult =
        serde_json::from_value(raw.clone()).map_err(|e| DecodeError::new(index, e.to_string()))?;

    let elements = raw
        .elements
        .into_iter()
        .enumerate()
        .map(|(pos, hit)| {
            Hit::decode(hit, request.entity_type())
                .map_err(|e| DecodeError::new(index, format!("element {pos}: {e}")))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let pagination = raw.pagination.unwrap_or_default();
    Ok(SearchResponse {
        entity_type: request.entity_type(),
        elements,
        facets: raw.facets,
        pagination: Pagination::derive(
            request.cursor(),
            pagination.cursor,
            pagination.total_elements,
            raw.total_pages,
        ),
        source: raw.source.unwrap_or_default().index_name,
    })
}

fn http_failure(status: StatusCode) -> SearchError {
    SearchError::transport(
        format!("gateway responded with HTTP {status}"),
        Some(status.as_u16()),
    )
}
