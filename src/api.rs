// API client module: a small blocking HTTP client shared by the Canvas,
// Top Hat and Lighthouse clients. Every call that should survive rate
// limiting or a flaky server goes through `retry::call`.

use crate::error::{LugachError, Result};
use crate::retry::{self, Success};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod canvas;
pub mod lighthouse;
pub mod tophat;

/// Query string parameters. Keys may repeat (`student_ids[]`).
pub type Params = Vec<(&'static str, String)>;

/// Holds a reqwest blocking client, the base URL of one service and an
/// optional bearer token for authenticated calls.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry_attempts: u32,
}

impl ApiClient {
    pub fn new(base_url: &str, retry_attempts: u32) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            retry_attempts,
        })
    }

    /// Store a bearer token for subsequent requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.set_token(token);
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            let val = HeaderValue::from_str(&format!("Bearer {}", t))
                .map_err(|_| LugachError::config("API token contains characters not allowed in a header"))?;
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    // Callers build `headers` once, outside any retry loop, so a bad token
    // surfaces as a config error.
    fn request(&self, method: Method, url: &str, headers: &HeaderMap, params: &[(&'static str, String)]) -> RequestBuilder {
        tracing::debug!(%method, %url, "building request");
        self.client
            .request(method, url)
            .headers(headers.clone())
            .query(params)
    }

    /// GET with retries, expecting 200.
    pub fn get(&self, path: &str, params: &[(&'static str, String)]) -> Result<Response> {
        self.get_until(path, params, StatusCode::OK)
    }

    /// GET with retries until `expected` accepts the status.
    pub fn get_until(
        &self,
        path: &str,
        params: &[(&'static str, String)],
        expected: impl Into<Success>,
    ) -> Result<Response> {
        let headers = self.auth_headers()?;
        let url = self.url(path);
        let label = Method::GET.to_string();
        retry::call(&label, self.retry_attempts, expected, || {
            self.request(Method::GET, &url, &headers, params).send()
        })
    }

    /// GET with retries and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&'static str, String)]) -> Result<T> {
        Ok(self.get(path, params)?.json()?)
    }

    /// Send a JSON body with retries until `expected` accepts the status.
    pub fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        body: &B,
        expected: impl Into<Success>,
    ) -> Result<Response> {
        let headers = self.auth_headers()?;
        let url = self.url(path);
        let label = method.to_string();
        retry::call(&label, self.retry_attempts, expected, || {
            self.request(method.clone(), &url, &headers, params).json(body).send()
        })
    }
}
