//! Remote API: response envelope, page results and the per-entity CRUD trait.
//!
//! Every endpoint answers with `{ code, message, data }`. A `code` other than
//! [`SUCCESS_CODE`] is turned into [`BackstageError::Api`] by the HTTP client,
//! so controllers only see successful envelopes on the `Ok` path.

pub mod http;
pub mod resource;

pub use http::HttpClient;
pub use resource::ResourceApi;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque form data: field name to value.
pub type FormData = serde_json::Map<String, Value>;

/// Envelope code for a successful call.
pub const SUCCESS_CODE: i64 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// One page of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(default)]
    pub items: Vec<FormData>,
    #[serde(default)]
    pub total: u64,
}

/// Outcome of a mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiMessage {
    pub code: i64,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// The server message, or `fallback` when the server sent none.
    pub fn text_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.message.is_empty() {
            fallback
        } else {
            &self.message
        }
    }
}

/// Request/response operations on one entity type.
pub trait CrudApi {
    fn list(&self, query: &FormData) -> Result<PageResult>;

    fn get_by_id(&self, id: &str) -> Result<FormData>;

    fn create(&self, record: &FormData) -> Result<ApiMessage>;

    fn update(&self, id: &str, record: &FormData) -> Result<ApiMessage>;

    fn delete(&self, id: &str) -> Result<ApiMessage>;
}

/// Render a form value for display or a query string: strings unquoted,
/// null as empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
