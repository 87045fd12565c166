//! Error types for the tekdrive crate.

use std::error::Error as StdError;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::casing::snake_case_keys;
use crate::transport::HttpResponse;

/// Header carrying the server-side correlation id of a request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Errors that can occur when talking to the Drive API.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The caller misused the API (missing arguments, conflicting arguments).
    #[error("{0}")]
    Client(String),

    #[error("Invalid authorizer: {0}")]
    InvalidAuthorizer(String),

    /// The HTTP call never produced a response.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The server answered with an error status and no API error body.
    #[error(transparent)]
    Response(ResponseError),

    #[error("Response did not contain valid JSON: {0}")]
    BadJson(ResponseError),

    /// The server answered with a structured API error.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Unknown status code: {0}")]
    UnexpectedStatus(u16),

    #[error("'{entity}' object has no attribute '{attribute}'")]
    MissingAttribute {
        entity: &'static str,
        attribute: String,
    },

    #[error("Expected {expected} but the response resolved to {found}")]
    UnexpectedModel {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage transfer failed: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl DriveError {
    /// The API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            DriveError::Api(api) => Some(api),
            _ => None,
        }
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;

/// Transport-level failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    Connect,
    Timeout,
    /// The response body was cut off or badly framed.
    Body,
    Other,
}

/// A request that failed before a response was received.
///
/// Carries the original cause together with the call arguments so callers can
/// tell which request failed.
#[derive(Error, Debug)]
#[error("Error with request {method} {url}: {source}")]
pub struct RequestError {
    pub kind: RequestErrorKind,
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl RequestError {
    pub fn new(
        kind: RequestErrorKind,
        method: Method,
        url: impl Into<String>,
        query: Vec<(String, String)>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            method,
            url: url.into(),
            query,
            source: source.into(),
        }
    }

    /// Classify a reqwest failure.
    pub fn from_reqwest(
        error: reqwest::Error,
        method: Method,
        url: impl Into<String>,
        query: Vec<(String, String)>,
    ) -> Self {
        let kind = if error.is_timeout() {
            RequestErrorKind::Timeout
        } else if error.is_connect() {
            RequestErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            RequestErrorKind::Body
        } else {
            RequestErrorKind::Other
        };
        Self::new(kind, method, url, query, error)
    }

    /// Connection errors, timeouts and broken body framing are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            RequestErrorKind::Connect | RequestErrorKind::Timeout | RequestErrorKind::Body
        )
    }
}

/// HTTP status errors, mapped one-to-one from the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Gone,
    Unprocessable,
    ServerError,
}

impl HttpErrorKind {
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            409 => Some(Self::Conflict),
            410 => Some(Self::Gone),
            422 => Some(Self::Unprocessable),
            _ if status.is_server_error() => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// A completed response the client could not accept.
#[derive(Error, Debug, Clone)]
#[error("Received {status} HTTP response")]
pub struct ResponseError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ResponseError {
    pub fn kind(&self) -> Option<HttpErrorKind> {
        HttpErrorKind::from_status(self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl From<HttpResponse> for ResponseError {
    fn from(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}

/// Error codes returned in API error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ArtifactNotFound,
    FileGone,
    FileNotFound,
    FolderGone,
    FolderNotFound,
    Forbidden,
    UnprocessableEntity,
    Other(String),
}

impl ErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "ARTIFACT_NOT_FOUND" => Self::ArtifactNotFound,
            "FILE_GONE" => Self::FileGone,
            "FILE_NOT_FOUND" => Self::FileNotFound,
            "FOLDER_GONE" => Self::FolderGone,
            "FOLDER_NOT_FOUND" => Self::FolderNotFound,
            "FORBIDDEN" => Self::Forbidden,
            "UNPROCESSABLE_ENTITY" => Self::UnprocessableEntity,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ArtifactNotFound => "ARTIFACT_NOT_FOUND",
            Self::FileGone => "FILE_GONE",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::FolderGone => "FOLDER_GONE",
            Self::FolderNotFound => "FOLDER_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::Other(code) => code,
        }
    }
}

/// Structured error returned by the Drive API.
#[derive(Error, Debug, Clone)]
#[error("API error {}: {message}", .code.as_str())]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    errors: Option<Value>,
    request_id: Option<String>,
    status: Option<StatusCode>,
}

impl ApiError {
    /// Build from a decoded error body. Returns `None` when the body has no error code.
    pub fn from_body(body: &Value, headers: &HeaderMap, status: Option<StatusCode>) -> Option<Self> {
        let body = snake_case_keys(body.clone());
        let code = body.get("error_code")?.as_str()?;

        Some(Self {
            code: ErrorCode::parse(code),
            message: body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            errors: body.get("errors").cloned(),
            request_id: headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            status,
        })
    }

    /// Build from an error response, if its body is an API error.
    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        let body: Value = serde_json::from_slice(&response.body).ok()?;
        Self::from_body(&body, &response.headers, Some(response.status))
    }

    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    /// The raw error code string, e.g. `FILE_GONE`.
    pub fn error_code(&self) -> &str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> Option<&Value> {
        self.errors.as_ref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_error_code_lookup() {
        assert_eq!(ErrorCode::parse("FILE_GONE"), ErrorCode::FileGone);
        assert_eq!(ErrorCode::parse("FORBIDDEN"), ErrorCode::Forbidden);
        assert_eq!(
            ErrorCode::parse("UNPROCESSABLE_ENTITY"),
            ErrorCode::UnprocessableEntity
        );
        assert_eq!(
            ErrorCode::parse("SOMETHING_NEW"),
            ErrorCode::Other("SOMETHING_NEW".to_string())
        );
        assert_eq!(ErrorCode::parse("SOMETHING_NEW").as_str(), "SOMETHING_NEW");
    }

    #[test]
    fn test_api_error_from_body() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-Id", HeaderValue::from_static("req-42"));
        let body = json!({
            "errorCode": "FOLDER_NOT_FOUND",
            "message": "Folder not found",
            "errors": [{"field": "folderId"}]
        });

        let error = ApiError::from_body(&body, &headers, Some(StatusCode::NOT_FOUND)).unwrap();
        assert_eq!(error.code(), &ErrorCode::FolderNotFound);
        assert_eq!(error.error_code(), "FOLDER_NOT_FOUND");
        assert_eq!(error.message(), "Folder not found");
        assert_eq!(error.request_id(), Some("req-42"));
        assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(error.errors().unwrap()[0]["field"], "folderId");
    }

    #[test]
    fn test_api_error_requires_code() {
        let body = json!({"message": "nope"});
        assert!(ApiError::from_body(&body, &HeaderMap::new(), None).is_none());
    }

    #[test]
    fn test_http_error_kind_table() {
        assert_eq!(
            HttpErrorKind::from_status(StatusCode::BAD_REQUEST),
            Some(HttpErrorKind::BadRequest)
        );
        assert_eq!(
            HttpErrorKind::from_status(StatusCode::GONE),
            Some(HttpErrorKind::Gone)
        );
        assert_eq!(
            HttpErrorKind::from_status(StatusCode::from_u16(522).unwrap()),
            Some(HttpErrorKind::ServerError)
        );
        assert_eq!(HttpErrorKind::from_status(StatusCode::OK), None);
        assert_eq!(HttpErrorKind::from_status(StatusCode::IM_A_TEAPOT), None);
    }

    #[test]
    fn test_request_error_retryable() {
        let error = RequestError::new(
            RequestErrorKind::Timeout,
            Method::GET,
            "https://drive.api.tekcloud.com/file/abc",
            vec![],
            "timed out",
        );
        assert!(error.is_retryable());
        assert!(error.to_string().contains("/file/abc"));

        let error = RequestError::new(RequestErrorKind::Other, Method::GET, "u", vec![], "bad");
        assert!(!error.is_retryable());
    }
}
