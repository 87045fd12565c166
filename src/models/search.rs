//! Searching files and folders by name, type or upload state.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;

use crate::casing::to_camel_case;
use crate::error::{DriveError, Result};
use crate::models::paginator::PaginatedListGenerator;
use crate::routing::{endpoints, Route};
use crate::session::Session;

/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Search criteria. At least one of `name`, `file_type` or `upload_state`
/// must be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub file_type: Option<String>,
    pub upload_state: Option<String>,
    pub include_files: Option<bool>,
    pub include_folders: Option<bool>,
    /// `SHARES` or `PERSONAL`.
    pub silo: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<usize>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            name: None,
            file_type: None,
            upload_state: None,
            include_files: None,
            include_folders: None,
            silo: None,
            order_by: None,
            limit: Some(DEFAULT_SEARCH_LIMIT),
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn upload_state(mut self, upload_state: impl Into<String>) -> Self {
        self.upload_state = Some(upload_state.into());
        self
    }

    pub fn include_files(mut self, include: bool) -> Self {
        self.include_files = Some(include);
        self
    }

    pub fn include_folders(mut self, include: bool) -> Self {
        self.include_folders = Some(include);
        self
    }

    pub fn silo(mut self, silo: impl Into<String>) -> Self {
        self.silo = Some(silo.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// `None` returns every match.
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    fn has_criteria(&self) -> bool {
        self.name.is_some() || self.file_type.is_some() || self.upload_state.is_some()
    }

    fn params(&self) -> BTreeMap<String, String> {
        let strings = [
            ("name", &self.name),
            ("file_type", &self.file_type),
            ("upload_state", &self.upload_state),
            ("silo", &self.silo),
            ("order_by", &self.order_by),
        ];
        let flags = [
            ("include_files", self.include_files),
            ("include_folders", self.include_folders),
        ];

        strings
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (to_camel_case(key), v.clone())))
            .chain(
                flags
                    .into_iter()
                    .filter_map(|(key, value)| value.map(|v| (to_camel_case(key), v.to_string()))),
            )
            .collect()
    }
}

/// Search over files and folders.
#[derive(Debug, Clone)]
pub struct Search {
    session: Arc<Session>,
}

impl Search {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Matches are yielded as [`Parsed::File`](crate::models::Parsed::File)
    /// or [`Parsed::Folder`](crate::models::Parsed::Folder).
    pub fn query(&self, query: &SearchQuery) -> Result<PaginatedListGenerator> {
        if !query.has_criteria() {
            return Err(DriveError::Client(
                "Must supply `name`, `file_type`, or `upload_state`.".to_string(),
            ));
        }
        let route = Route::plain(Method::GET, endpoints::SEARCH);
        Ok(PaginatedListGenerator::new(
            Arc::clone(&self.session),
            route,
            query.limit,
            query.params(),
        ))
    }
}
