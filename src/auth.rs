//! Access-key authorization.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, Secret};

use crate::error::{DriveError, Result};

/// Header carrying the access key.
pub const ACCESS_KEY_HEADER: &str = "X-IS-AK";

/// Produces the headers that authorize a request.
pub trait Authorizer: Send + Sync {
    fn auth_headers(&self) -> Result<HeaderMap>;
}

/// Authorizer for a single static access key.
pub struct AccessKeyAuthorizer {
    access_key: Secret<String>,
}

impl AccessKeyAuthorizer {
    pub fn new(access_key: impl Into<String>) -> Result<Self> {
        let access_key = access_key.into();
        if access_key.trim().is_empty() {
            return Err(DriveError::InvalidAuthorizer(
                "access key must not be empty".to_string(),
            ));
        }
        HeaderValue::from_str(&access_key).map_err(|_| {
            DriveError::InvalidAuthorizer("access key is not a valid header value".to_string())
        })?;

        Ok(Self {
            access_key: Secret::new(access_key),
        })
    }
}

impl Authorizer for AccessKeyAuthorizer {
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut value = HeaderValue::from_str(self.access_key.expose_secret())
            .map_err(|e| DriveError::InvalidAuthorizer(e.to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-is-ak"), value);
        Ok(headers)
    }
}

impl std::fmt::Debug for AccessKeyAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKeyAuthorizer")
            .field("access_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_header() {
        let auth = AccessKeyAuthorizer::new("my-key").unwrap();
        let headers = auth.auth_headers().unwrap();
        let value = headers.get(ACCESS_KEY_HEADER).unwrap();
        assert_eq!(value, "my-key");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            AccessKeyAuthorizer::new("  "),
            Err(DriveError::InvalidAuthorizer(_))
        ));
    }

    #[test]
    fn test_header_unsafe_key_rejected() {
        assert!(matches!(
            AccessKeyAuthorizer::new("bad\nkey"),
            Err(DriveError::InvalidAuthorizer(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let auth = AccessKeyAuthorizer::new("super-secret").unwrap();
        assert!(!format!("{auth:?}").contains("super-secret"));
    }
}
