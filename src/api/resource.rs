//! REST resource bound to an API path prefix.
//!
//! | Operation | Request |
//! |---|---|
//! | list | `GET {prefix}/page?page=..&pageSize=..&<filters>` |
//! | get_by_id | `GET {prefix}/{id}` |
//! | create | `POST {prefix}` |
//! | update | `PUT {prefix}/{id}` |
//! | delete | `DELETE {prefix}/{id}` |

use super::{ApiMessage, CrudApi, FormData, HttpClient, PageResult};
use crate::error::{BackstageError, Result};
use reqwest::Method;
use url::form_urlencoded;

/// API prefix of the article resource.
pub const ARTICLE_API: &str = "/content/article";

#[derive(Debug, Clone)]
pub struct ResourceApi {
    http: HttpClient,
    prefix: String,
}

impl ResourceApi {
    pub fn new(http: HttpClient, prefix: impl Into<String>) -> Self {
        Self {
            http,
            prefix: prefix.into(),
        }
    }

    /// The article resource.
    pub fn article(http: HttpClient) -> Self {
        Self::new(http, ARTICLE_API)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn item_path(&self, id: &str) -> String {
        let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
        format!("{}/{}", self.prefix, id)
    }

    fn mutate(&self, method: Method, path: &str, body: Option<&FormData>) -> Result<ApiMessage> {
        let resp = self
            .http
            .send_json::<serde_json::Value, FormData>(method, path, body)?;
        Ok(ApiMessage {
            code: resp.code,
            message: resp.message,
        })
    }
}

impl CrudApi for ResourceApi {
    fn list(&self, query: &FormData) -> Result<PageResult> {
        let path = format!("{}/page", self.prefix);
        let resp = self.http.get::<PageResult>(&path, query)?;
        Ok(resp.data.unwrap_or_default())
    }

    fn get_by_id(&self, id: &str) -> Result<FormData> {
        let path = self.item_path(id);
        let resp = self.http.get::<FormData>(&path, &FormData::new())?;
        resp.data.ok_or(BackstageError::NotFound(path))
    }

    fn create(&self, record: &FormData) -> Result<ApiMessage> {
        self.mutate(Method::POST, &self.prefix, Some(record))
    }

    fn update(&self, id: &str, record: &FormData) -> Result<ApiMessage> {
        self.mutate(Method::PUT, &self.item_path(id), Some(record))
    }

    fn delete(&self, id: &str) -> Result<ApiMessage> {
        self.mutate(Method::DELETE, &self.item_path(id), None)
    }
}
