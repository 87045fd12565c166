//! Folder tree listings.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;

use crate::casing::to_camel_case;
use crate::error::Result;
use crate::models::folder::Folder;
use crate::routing::{endpoints, Route};
use crate::session::{RequestOptions, Session};

/// Where a tree listing starts and how much of it to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    /// Starting folder. The user's root when unset.
    pub folder_id: Option<String>,
    /// `SHARES` or `PERSONAL`.
    pub silo: Option<String>,
    /// Nesting levels to return.
    pub depth: Option<u32>,
    pub folders_only: bool,
    pub include_trashed: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            folder_id: None,
            silo: None,
            depth: Some(1),
            folders_only: false,
            include_trashed: false,
        }
    }
}

impl TreeOptions {
    pub fn folder(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: Some(folder_id.into()),
            ..Self::default()
        }
    }

    pub fn silo(silo: impl Into<String>) -> Self {
        Self {
            silo: Some(silo.into()),
            ..Self::default()
        }
    }

    fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            params.insert(to_camel_case(key), value);
        };
        if let Some(folder_id) = &self.folder_id {
            put("folder_id", folder_id.clone());
        }
        if let Some(silo) = &self.silo {
            put("silo", silo.clone());
        }
        if let Some(depth) = self.depth {
            put("depth", depth.to_string());
        }
        put("folders_only", self.folders_only.to_string());
        put("include_trashed", self.include_trashed.to_string());
        params
    }
}

/// Directory listings.
#[derive(Debug, Clone)]
pub struct Tree {
    session: Arc<Session>,
}

impl Tree {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// The starting folder, with [`Folder::children`] populated.
    pub async fn get(&self, options: &TreeOptions) -> Result<Folder> {
        let route = Route::plain(Method::GET, endpoints::TREE);
        let request = RequestOptions::new().params(options.params());
        self.session.request(&route, &request).await?.into_folder()
    }
}
