//! HTTP transport abstraction and the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{RequestError, RequestErrorKind};

/// Sends fully-formed requests. Swapped out in tests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError>;
}

/// One file field of a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content: Bytes,
    pub mime_type: String,
}

impl FilePart {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content: content.into(),
            mime_type: "application/octet-stream".to_string(),
        }
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// Request body variants.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Bytes(Bytes),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    fn error(&self, kind: RequestErrorKind, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> RequestError {
        RequestError::new(kind, self.method.clone(), self.url.as_str(), self.query.clone(), source)
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Reqwest-based HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a transport with the given user agent.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let mut req = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req = match &request.body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(value),
            RequestBody::Form(fields) => req.form(fields),
            RequestBody::Bytes(bytes) => req.body(bytes.clone()),
            RequestBody::Multipart { fields, files } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for file in files {
                    let part = Part::bytes(file.content.to_vec())
                        .file_name(file.file_name.clone())
                        .mime_str(&file.mime_type)
                        .map_err(|e| request.error(RequestErrorKind::Other, e))?;
                    form = form.part(file.field.clone(), part);
                }
                req.multipart(form)
            }
        };

        let response = req.send().await.map_err(|e| {
            RequestError::from_reqwest(e, request.method.clone(), request.url.as_str(), request.query.clone())
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            RequestError::from_reqwest(e, request.method.clone(), request.url.as_str(), request.query.clone())
        })?;

        Ok(HttpResponse::new(status, headers, body))
    }
}
