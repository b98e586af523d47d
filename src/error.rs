//! Error taxonomy for gateway searches.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::wire::null_default;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failure of a whole `search` call.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller misuse, detected before anything is sent.
    #[error("invalid search input: {0}")]
    Validation(String),

    /// Connectivity, timeout, non-2xx status or a body that is not JSON.
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The gateway answered with a top-level `errors` array.
    #[error("gateway returned {} GraphQL error(s): {}", .0.len(), join_messages(.0))]
    GraphQL(Vec<GraphQLErrorDetail>),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl SearchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            status,
            source: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source: Some(e), .. } if e.is_timeout())
    }

    /// HTTP status attached to a transport failure, if the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("could not connect to gateway: {e}")
        } else {
            e.to_string()
        };
        Self::Transport {
            message,
            status: e.status().map(|s| s.as_u16()),
            source: Some(e),
        }
    }
}

/// One result position that could not be mapped onto [`crate::SearchResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("result #{index} could not be decoded: {reason}")]
pub struct DecodeError {
    pub index: usize,
    pub reason: String,
}

impl DecodeError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// A GraphQL error exactly as the gateway reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLErrorDetail {
    #[serde(default, deserialize_with = "null_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_default")]
    pub locations: Vec<ErrorLocation>,
    #[serde(default, deserialize_with = "null_default")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLErrorDetail {
    /// Keeps whatever parts of an error entry are readable; only an entry
    /// with no string `message` at all is stored as its raw JSON text.
    pub fn from_raw(raw: &Value) -> Self {
        if let Ok(detail) = serde_json::from_value(raw.clone()) {
            return detail;
        }
        GraphQLErrorDetail {
            message: raw
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| raw.to_string()),
            locations: raw
                .get("locations")
                .and_then(Value::as_array)
                .map(|locs| {
                    locs.iter()
                        .filter_map(|loc| serde_json::from_value(loc.clone()).ok())
                        .collect()
                })
                .unwrap_or_default(),
            path: raw
                .get("path")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            extensions: raw.get("extensions").filter(|v| !v.is_null()).cloned(),
        }
    }
}

/// Position in the query document. A coordinate the gateway leaves out is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorLocation {
    pub line: u64,
    pub column: u64,
}

fn join_messages(errors: &[GraphQLErrorDetail]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
