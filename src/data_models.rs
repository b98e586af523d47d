use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, SearchError};
use crate::wire::{PRODUCT_HIT_TYPENAME, SUGGESTION_HIT_TYPENAME, null_default};

/// Outcome for one position of a batch.
pub type SearchOutcome = Result<SearchResponse, DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Products,
    Suggestions,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Products => "PRODUCTS",
            EntityType::Suggestions => "SUGGESTIONS",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRODUCTS" => Ok(EntityType::Products),
            "SUGGESTIONS" => Ok(EntityType::Suggestions),
            other => Err(SearchError::validation(format!(
                "unknown entity type {other:?}, expected PRODUCTS or SUGGESTIONS"
            ))),
        }
    }
}

/// Parameters for one index in a batched search.
///
/// Fields are private: a request is built once and then only copied into
/// follow-up requests through the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    entity_type: EntityType,
    query: String,
    limit: u32,
    cursor: String,
    facet_filters: Vec<String>,
    max_values_per_facet: u32,
    disable_recommender: bool,
}

impl SearchRequest {
    pub const INITIAL_CURSOR: &'static str = "0";
    pub const DEFAULT_MAX_VALUES_PER_FACET: u32 = 1000;

    pub fn new(entity_type: EntityType, query: impl Into<String>, limit: u32) -> SearchRequest {
        SearchRequest {
            entity_type,
            query: query.into(),
            limit,
            cursor: Self::INITIAL_CURSOR.to_string(),
            facet_filters: Vec::new(),
            max_values_per_facet: Self::DEFAULT_MAX_VALUES_PER_FACET,
            disable_recommender: true,
        }
    }

    pub fn products(query: impl Into<String>, limit: u32) -> SearchRequest {
        Self::new(EntityType::Products, query, limit)
    }

    pub fn suggestions(query: impl Into<String>, limit: u32) -> SearchRequest {
        Self::new(EntityType::Suggestions, query, limit)
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> SearchRequest {
        self.cursor = cursor.into();
        self
    }

    pub fn with_facet_filters(mut self, filters: Vec<String>) -> SearchRequest {
        self.facet_filters = filters;
        self
    }

    pub fn with_facet_filter(mut self, filter: impl Into<String>) -> SearchRequest {
        self.facet_filters.push(filter.into());
        self
    }

    pub fn with_max_values_per_facet(mut self, max: u32) -> SearchRequest {
        self.max_values_per_facet = max;
        self
    }

    pub fn with_disable_recommender(mut self, disable: bool) -> SearchRequest {
        self.disable_recommender = disable;
        self
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn facet_filters(&self) -> &[String] {
        &self.facet_filters
    }

    pub fn max_values_per_facet(&self) -> u32 {
        self.max_values_per_facet
    }

    pub fn disable_recommender(&self) -> bool {
        self.disable_recommender
    }

    pub(crate) fn validate(&self, index: usize) -> Result<(), SearchError> {
        if self.limit == 0 {
            return Err(SearchError::validation(format!(
                "request #{index}: limit must be greater than zero"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub entity_type: EntityType,
    pub elements: Vec<Hit>,
    pub facets: Vec<Facet>,
    pub pagination: Pagination,
    /// Index the gateway served this result from.
    pub source: String,
}

impl SearchResponse {
    pub fn products(&self) -> impl Iterator<Item = &ProductHit> {
        self.elements.iter().filter_map(|hit| match hit {
            Hit::Product(p) => Some(p),
            _ => None,
        })
    }

    pub fn suggestions(&self) -> impl Iterator<Item = &SuggestionHit> {
        self.elements.iter().filter_map(|hit| match hit {
            Hit::Suggestion(s) => Some(s),
            _ => None,
        })
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more
    }

    /// The request for the following page, or `None` on the last one.
    pub fn next_request(&self, previous: &SearchRequest) -> Option<SearchRequest> {
        if !self.pagination.has_more {
            return None;
        }
        let cursor = self.pagination.cursor.clone()?;
        Some(previous.clone().with_cursor(cursor))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Next cursor exactly as returned by the gateway.
    pub cursor: Option<String>,
    pub has_more: bool,
    pub total_elements: Option<u64>,
    pub total_pages: Option<u64>,
}

impl Pagination {
    /// `has_more` holds only when the gateway handed back a cursor that
    /// differs from the one we sent.
    pub fn derive(
        sent_cursor: &str,
        next_cursor: Option<String>,
        total_elements: Option<u64>,
        total_pages: Option<u64>,
    ) -> Pagination {
        let has_more = next_cursor
            .as_deref()
            .is_some_and(|next| !next.is_empty() && next != sent_cursor);
        Pagination {
            cursor: next_cursor,
            has_more,
            total_elements,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Hit {
    Product(ProductHit),
    Suggestion(SuggestionHit),
    /// A hit kind this client does not model, e.g. `Search_ArticleHit`.
    Other {
        typename: String,
        id: Option<String>,
        name: Option<String>,
        url: Option<String>,
    },
}

impl Hit {
    /// Picks the variant from `__typename`, falling back to the entity type
    /// that was requested when the gateway omits it.
    pub fn decode(raw: Value, requested: EntityType) -> Result<Hit, serde_json::Error> {
        let typename = raw
            .get("__typename")
            .and_then(Value::as_str)
            .map(str::to_owned);
        match typename.as_deref() {
            Some(PRODUCT_HIT_TYPENAME) => Ok(Hit::Product(serde_json::from_value(raw)?)),
            Some(SUGGESTION_HIT_TYPENAME) => Ok(Hit::Suggestion(serde_json::from_value(raw)?)),
            Some(other) => {
                let text = |field: &str| raw.get(field).and_then(Value::as_str).map(str::to_owned);
                Ok(Hit::Other {
                    typename: other.to_string(),
                    id: text("id"),
                    name: text("name"),
                    url: text("url"),
                })
            }
            None => match requested {
                EntityType::Products => Ok(Hit::Product(serde_json::from_value(raw)?)),
                EntityType::Suggestions => Ok(Hit::Suggestion(serde_json::from_value(raw)?)),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub product_type: ProductType,
    #[serde(default, deserialize_with = "null_default")]
    pub is_course_free: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub is_part_of_coursera_plus: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub partners: Vec<String>,
    #[serde(default)]
    pub avg_product_rating: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub num_product_ratings: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_difficulty_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ProductType {
    Course,
    Specialization,
    ProfessionalCertificate,
    GuidedProject,
    Project,
    Degree,
    Other(String),
    #[default]
    Unknown,
}

impl From<Option<String>> for ProductType {
    fn from(raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return ProductType::Unknown;
        };
        match raw.to_ascii_uppercase().as_str() {
            "COURSE" => ProductType::Course,
            "SPECIALIZATION" => ProductType::Specialization,
            "PROFESSIONAL CERTIFICATE" => ProductType::ProfessionalCertificate,
            "GUIDED PROJECT" => ProductType::GuidedProject,
            "PROJECT" => ProductType::Project,
            "DEGREE" => ProductType::Degree,
            "" => ProductType::Unknown,
            _ => ProductType::Other(raw),
        }
    }
}

impl ProductType {
    pub fn as_str(&self) -> &str {
        match self {
            ProductType::Course => "COURSE",
            ProductType::Specialization => "SPECIALIZATION",
            ProductType::ProfessionalCertificate => "PROFESSIONAL CERTIFICATE",
            ProductType::GuidedProject => "GUIDED PROJECT",
            ProductType::Project => "PROJECT",
            ProductType::Degree => "DEGREE",
            ProductType::Other(raw) => raw,
            ProductType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProductType> for String {
    fn from(kind: ProductType) -> Self {
        match kind {
            ProductType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionHit {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_display: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_default",
        rename(deserialize = "valuesAndCounts")
    )]
    pub values: Vec<FacetValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetValue {
    #[serde(default, deserialize_with = "null_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_default")]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_display: Option<String>,
}
