//! Shapes that cross the network.
//!
//! Field names here must match what the gateway accepts byte for byte; they
//! are not derived from the Rust names of the public model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::data_models::{EntityType, Facet, SearchRequest};
use crate::error::GraphQLErrorDetail;
use crate::query::{OPERATION_NAME, SEARCH_DOCUMENT};

pub const PRODUCT_HIT_TYPENAME: &str = "Search_ProductHit";
pub const SUGGESTION_HIT_TYPENAME: &str = "Search_SuggestionHit";

/// Treats an explicit `null` like an absent field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Cursors are opaque; some indices hand them back as bare numbers.
pub(crate) fn opaque_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest<'a> {
    pub entity_type: EntityType,
    pub limit: u32,
    pub disable_recommender: bool,
    pub max_values_per_facet: u32,
    pub facet_filters: &'a [String],
    pub cursor: &'a str,
    pub query: &'a str,
}

impl<'a> From<&'a SearchRequest> for WireRequest<'a> {
    fn from(request: &'a SearchRequest) -> Self {
        WireRequest {
            entity_type: request.entity_type(),
            limit: request.limit(),
            disable_recommender: request.disable_recommender(),
            max_values_per_facet: request.max_values_per_facet(),
            facet_filters: request.facet_filters(),
            cursor: request.cursor(),
            query: request.query(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Variables<'a> {
    pub requests: Vec<WireRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation<'a> {
    pub operation_name: &'static str,
    pub variables: Variables<'a>,
    pub query: &'static str,
}

/// The POST body: a batch holding the single `Search` operation.
pub fn encode_batch(requests: &[SearchRequest]) -> [Operation<'_>; 1] {
    [Operation {
        operation_name: OPERATION_NAME,
        variables: Variables {
            requests: requests.iter().map(WireRequest::from).collect(),
        },
        query: SEARCH_DOCUMENT,
    }]
}

/// Batched posts are answered with an array of envelopes; ours holds one.
pub fn unwrap_batch(body: Value) -> Value {
    match body {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        Value::Array(_) => Value::Null,
        other => other,
    }
}

/// Top-level GraphQL errors, or an empty list when there are none.
pub fn graphql_errors(envelope: &Value) -> Vec<GraphQLErrorDetail> {
    let Some(errors) = envelope.get("errors").and_then(Value::as_array) else {
        return Vec::new();
    };
    errors.iter().map(GraphQLErrorDetail::from_raw).collect()
}

/// The per-request result list, `data.SearchResult.search`.
pub fn search_results(envelope: &Value) -> Option<&Vec<Value>> {
    envelope
        .pointer("/data/SearchResult/search")
        .and_then(Value::as_array)
}

/// One `Search_Result` as received. Only `elements` is mandatory.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResult {
    pub elements: Vec<Value>,
    #[serde(default, deserialize_with = "null_default")]
    pub facets: Vec<Facet>,
    #[serde(default)]
    pub pagination: Option<RawPagination>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub source: Option<RawSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPagination {
    #[serde(default, deserialize_with = "opaque_cursor")]
    pub cursor: Option<String>,
    #[serde(default)]
    pub total_elements: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSource {
    #[serde(default, deserialize_with = "null_default")]
    pub index_name: String,
}
