//! Request execution: authorization, rate limiting, retries and status mapping.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Authorizer;
use crate::config::ClientConfig;
use crate::error::{ApiError, DriveError, HttpErrorKind, Result};
use crate::models::parser::{Parsed, Parser};
use crate::retry::{is_retryable_status, RateLimit, RetryPolicy};
use crate::routing::Route;
use crate::transport::{FilePart, HttpRequest, HttpResponse, HttpTransport, RequestBody, ReqwestTransport};

/// Waits between attempts. Replaced in tests to observe backoff.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Per-request inputs besides the route.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Form fields. Sent as multipart fields when `files` is non-empty.
    pub data: Option<Vec<(String, String)>>,
    pub files: Vec<FilePart>,
    pub json: Option<Value>,
    pub params: BTreeMap<String, String>,
    /// Replaces the authorization headers entirely.
    pub headers: Option<HeaderMap>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.data = Some(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    pub fn json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    fn into_body(self) -> RequestBody {
        if !self.files.is_empty() {
            return RequestBody::Multipart {
                fields: self.data.unwrap_or_default(),
                files: self.files,
            };
        }
        match (self.data, self.json) {
            (Some(fields), _) => RequestBody::Form(fields),
            (None, Some(json)) => RequestBody::Json(json),
            (None, None) => RequestBody::Empty,
        }
    }
}

/// Executes routes against the API. Shared by every object created from it.
pub struct Session {
    authorizer: Arc<dyn Authorizer>,
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    rate_limit: Mutex<RateLimit>,
}

impl Session {
    pub fn new(authorizer: Arc<dyn Authorizer>, config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_user_agent(&config.user_agent)
            .map_err(|e| DriveError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            authorizer,
            config,
            transport: Arc::new(transport),
            sleeper: Arc::new(TokioSleeper),
            rate_limit: Mutex::new(RateLimit::new()),
        })
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the current rate-limit window.
    pub async fn rate_limit(&self) -> RateLimit {
        self.rate_limit.lock().await.clone()
    }

    /// Execute `route` and resolve the response into a model.
    pub async fn request(self: &Arc<Self>, route: &Route, options: &RequestOptions) -> Result<Parsed> {
        let data = self.request_raw(route, options).await?;
        Parser::new(self).parse(data)
    }

    /// Execute `route` and return the decoded JSON body, or `None` for 204.
    pub async fn request_raw(&self, route: &Route, options: &RequestOptions) -> Result<Option<Value>> {
        let options = options.clone();
        if options.data.is_some() && options.json.is_some() {
            return Err(DriveError::Client(
                "Only supply one of: 'json', 'data'.".to_string(),
            ));
        }

        let headers = match options.headers.clone() {
            Some(headers) => headers,
            None => self.authorizer.auth_headers()?,
        };
        let query: Vec<(String, String)> = options
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let request = HttpRequest {
            method: route.method().clone(),
            url: self.config.url_for(route.path())?,
            headers,
            query,
            body: options.into_body(),
            timeout: Some(self.config.timeout),
        };

        debug!(method = %request.method, url = %request.url, query = ?request.query, "Request");

        let response = self.send_with_retry(request).await?;
        map_response(response)
    }

    async fn send_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut policy = RetryPolicy::new(self.config.retry);

        loop {
            self.wait_for_rate_limit().await;

            match self.transport.send(request.clone()).await {
                Ok(response) => {
                    self.rate_limit
                        .lock()
                        .await
                        .update_from_headers(&response.headers);
                    debug!(status = response.status.as_u16(), "Response");

                    if !is_retryable_status(response.status) || !policy.retries_remaining() {
                        return Ok(response);
                    }
                    policy.decrement_retries();
                    let backoff = policy.backoff();
                    warn!(
                        status = response.status.as_u16(),
                        attempt = policy.attempts_used(),
                        backoff_secs = backoff.as_secs_f64(),
                        "Retrying request after server error"
                    );
                    self.sleeper.sleep(backoff).await;
                }
                Err(error) => {
                    if !error.is_retryable() || !policy.retries_remaining() {
                        return Err(error.into());
                    }
                    policy.decrement_retries();
                    let backoff = policy.backoff();
                    warn!(
                        error = %error,
                        attempt = policy.attempts_used(),
                        backoff_secs = backoff.as_secs_f64(),
                        "Retrying request after transport error"
                    );
                    self.sleeper.sleep(backoff).await;
                }
            }
        }
    }

    async fn wait_for_rate_limit(&self) {
        let wait = self.rate_limit.lock().await.seconds_to_sleep();
        if let Some(wait) = wait {
            debug!(wait_secs = wait.as_secs_f64(), "Sleeping (rate limited)");
            self.sleeper.sleep(wait).await;
        }
    }

    /// PUT raw bytes to a storage URL. No authorization, no retries.
    pub async fn storage_put(&self, url: &str, content: Bytes) -> Result<()> {
        let mut request = HttpRequest::new(Method::PUT, Url::parse(url)?);
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        request.body = RequestBody::Bytes(content);
        request.timeout = Some(self.config.timeout);

        let response = self.transport.send(request).await?;
        if !response.status.is_success() {
            return Err(DriveError::Storage(format!(
                "Upload failed with status {}",
                response.status
            )));
        }
        Ok(())
    }

    /// GET the contents behind a storage URL.
    pub async fn storage_get(&self, url: &str) -> Result<Bytes> {
        let mut request = HttpRequest::new(Method::GET, Url::parse(url)?);
        request.timeout = Some(self.config.timeout);

        let response = self.transport.send(request).await?;
        if !response.status.is_success() {
            return Err(DriveError::Storage(format!(
                "Download failed with status {}",
                response.status
            )));
        }
        Ok(response.body)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url.as_str())
            .field("timeout", &self.config.timeout)
            .field("retry", &self.config.retry)
            .finish_non_exhaustive()
    }
}

fn map_response(response: HttpResponse) -> Result<Option<Value>> {
    let status = response.status;
    match status.as_u16() {
        204 => Ok(None),
        200 | 201 => match serde_json::from_slice::<Value>(&response.body) {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(DriveError::BadJson(response.into())),
        },
        _ if HttpErrorKind::from_status(status).is_some() => match ApiError::from_response(&response) {
            Some(api) => Err(DriveError::Api(api)),
            None => Err(DriveError::Response(response.into())),
        },
        other => Err(DriveError::UnexpectedStatus(other)),
    }
}
