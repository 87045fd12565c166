//! Request routes: an HTTP method plus a path template with its parameters filled in.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;

use crate::error::{DriveError, Result};

/// Characters kept verbatim in path segments: RFC 3986 unreserved plus `/`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Path templates for every API endpoint.
pub mod endpoints {
    pub const FILE_CREATE: &str = "/file";
    pub const FILE_DETAILS: &str = "/file/{file_id}";
    pub const FILE_MEMBERS: &str = "/file/{file_id}/members";
    pub const FILE_MEMBER: &str = "/file/{file_id}/members/{member_id}";
    pub const FILE_UPLOAD: &str = "/file/{file_id}/uploadUrl";
    pub const FILE_DOWNLOAD: &str = "/file/{file_id}/downloadUrl";
    pub const FOLDER_CREATE: &str = "/folder";
    pub const FOLDER_DETAILS: &str = "/folder/{folder_id}";
    pub const FOLDER_MEMBERS: &str = "/folder/{folder_id}/members";
    pub const FOLDER_MEMBER: &str = "/folder/{folder_id}/members/{member_id}";
    pub const SEARCH: &str = "/search";
    pub const TRASH: &str = "/trash";
    pub const TREE: &str = "/tree";
    pub const USER: &str = "/user";
    pub const USER_USAGE: &str = "/user/usage";
}

/// A path parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteParam {
    /// Percent-encoded on substitution.
    Str(String),
    /// Inserted as-is (booleans, integers).
    Raw(String),
}

impl From<&str> for RouteParam {
    fn from(value: &str) -> Self {
        RouteParam::Str(value.to_string())
    }
}

impl From<String> for RouteParam {
    fn from(value: String) -> Self {
        RouteParam::Str(value)
    }
}

impl From<&String> for RouteParam {
    fn from(value: &String) -> Self {
        RouteParam::Str(value.clone())
    }
}

impl From<bool> for RouteParam {
    fn from(value: bool) -> Self {
        RouteParam::Raw(value.to_string())
    }
}

impl From<i64> for RouteParam {
    fn from(value: i64) -> Self {
        RouteParam::Raw(value.to_string())
    }
}

impl From<u64> for RouteParam {
    fn from(value: u64) -> Self {
        RouteParam::Raw(value.to_string())
    }
}

impl RouteParam {
    fn as_raw(&self) -> &str {
        match self {
            RouteParam::Str(s) | RouteParam::Raw(s) => s,
        }
    }

    fn encoded(&self) -> String {
        match self {
            RouteParam::Str(s) => utf8_percent_encode(s, PATH_ENCODE_SET).to_string(),
            RouteParam::Raw(s) => s.clone(),
        }
    }
}

/// A fully resolved request route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Method,
    template: &'static str,
    path: String,
    params: BTreeMap<String, RouteParam>,
}

impl Route {
    /// Resolve `template` against `params`.
    ///
    /// ```
    /// use reqwest::Method;
    /// use tekdrive::routing::{endpoints, Route};
    ///
    /// let route = Route::new(Method::GET, endpoints::FILE_DETAILS, [("file_id", "a b")]).unwrap();
    /// assert_eq!(route.path(), "/file/a%20b");
    /// assert_eq!(route.file_id(), Some("a b"));
    /// ```
    pub fn new<K, V>(
        method: Method,
        template: &'static str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<RouteParam>,
    {
        let params: BTreeMap<String, RouteParam> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let path = render(template, &params)?;

        Ok(Self {
            method,
            template,
            path,
            params,
        })
    }

    /// A route whose template has no placeholders.
    pub fn plain(method: Method, template: &'static str) -> Self {
        Self {
            method,
            template,
            path: template.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The unencoded value of a path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(RouteParam::as_raw)
    }

    pub fn file_id(&self) -> Option<&str> {
        self.param("file_id")
    }

    pub fn folder_id(&self) -> Option<&str> {
        self.param("folder_id")
    }

    pub fn member_id(&self) -> Option<&str> {
        self.param("member_id")
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

fn render(template: &str, params: &BTreeMap<String, RouteParam>) -> Result<String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let close = rest[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| DriveError::Client(format!("Malformed route template '{template}'.")))?;
        let name = &rest[open + 1..close];
        let value = params.get(name).ok_or_else(|| {
            DriveError::Client(format!("Missing route parameter '{name}' for '{template}'."))
        })?;

        path.push_str(&rest[..open]);
        path.push_str(&value.encoded());
        rest = &rest[close + 1..];
    }
    path.push_str(rest);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_route() {
        let route = Route::plain(Method::GET, endpoints::USER);
        assert_eq!(route.path(), "/user");
        assert_eq!(route.file_id(), None);
        assert_eq!(route.to_string(), "GET /user");
    }

    #[test]
    fn test_multiple_params() {
        let route = Route::new(
            Method::PUT,
            endpoints::FOLDER_MEMBER,
            [("folder_id", "f-1"), ("member_id", "m_2")],
        )
        .unwrap();
        assert_eq!(route.path(), "/folder/f-1/members/m_2");
        assert_eq!(route.folder_id(), Some("f-1"));
        assert_eq!(route.member_id(), Some("m_2"));
    }

    #[test]
    fn test_string_params_are_quoted() {
        let route = Route::new(Method::GET, endpoints::FILE_DETAILS, [("file_id", "a/b c?d")]).unwrap();
        assert_eq!(route.path(), "/file/a/b%20c%3Fd");
        assert_eq!(route.file_id(), Some("a/b c?d"));
    }

    #[test]
    fn test_raw_params_are_verbatim() {
        let route = Route::new(
            Method::GET,
            "/thing/{flag}/{count}",
            [("flag", RouteParam::from(true)), ("count", RouteParam::from(42i64))],
        )
        .unwrap();
        assert_eq!(route.path(), "/thing/true/42");
    }

    #[test]
    fn test_missing_param_is_client_error() {
        let err = Route::new(Method::GET, endpoints::FILE_MEMBER, [("file_id", "abc")]).unwrap_err();
        assert!(matches!(err, DriveError::Client(msg) if msg.contains("member_id")));
    }
}
