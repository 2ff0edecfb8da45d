//! Blocking HTTP transport for the remote API.

use super::{ApiResponse, FormData, SUCCESS_CODE};
use crate::error::{BackstageError, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Thin wrapper around a reqwest client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackstageError::Http(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/content/article/page`.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "api request");
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, query: &FormData) -> Result<ApiResponse<T>> {
        let req = self.request(Method::GET, path).query(&query_pairs(query));
        self.send(req)
    }

    pub fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>> {
        let mut req = self.request(method, path);
        if let Some(body) = body {
            req = req.json(body);
        }
        self.send(req)
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<ApiResponse<T>> {
        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;
        decode_envelope(status.as_u16(), &body)
    }
}

/// Join a base URL and an API path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Query parameters for a GET: null and empty-string values are skipped.
pub fn query_pairs(query: &FormData) -> Vec<(String, String)> {
    query
        .iter()
        .filter(|(_, v)| !v.is_null() && v.as_str() != Some(""))
        .map(|(k, v)| (k.clone(), super::value_text(v)))
        .collect()
}

/// Turn an HTTP status and body into an envelope, mapping failures to errors.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<ApiResponse<T>> {
    let parsed: std::result::Result<ApiResponse<T>, _> = serde_json::from_str(body);
    match parsed {
        Ok(envelope) if (200..300).contains(&status) && envelope.code == SUCCESS_CODE => {
            Ok(envelope)
        }
        Ok(envelope) => Err(BackstageError::Api {
            code: envelope.code,
            message: envelope.message,
        }),
        Err(_) if !(200..300).contains(&status) => Err(BackstageError::Http(format!(
            "status {}: {}",
            status,
            if body.is_empty() { "<empty body>" } else { body }
        ))),
        Err(e) => Err(e.into()),
    }
}
