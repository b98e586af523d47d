pub mod client;
pub mod config;
pub mod data_models;
pub mod display;
pub mod error;
pub mod paginator;
pub mod query;
pub mod wire;

pub use client::SearchClient;
pub use config::ClientConfig;
pub use display::Summary;
pub use data_models::{
    EntityType, Facet, FacetValue, Hit, Pagination, ProductHit, ProductType, SearchOutcome,
    SearchRequest, SearchResponse, SuggestionHit,
};
pub use error::{DecodeError, GraphQLErrorDetail, SearchError};
pub use paginator::Paginator;
