//! The Drive client facade.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::AccessKeyAuthorizer;
use crate::config::{ClientConfig, ENV_ACCESS_KEY};
use crate::error::{DriveError, Result};
use crate::models::{
    File, FileHelper, Folder, FolderHelper, Parsed, Search, Trashcan, Tree, User,
};
use crate::routing::Route;
use crate::session::{RequestOptions, Session};

/// Entry point to the Drive API.
///
/// Cloning is cheap; clones share one [`Session`] and with it the rate-limit
/// window.
#[derive(Debug, Clone)]
pub struct DriveClient {
    session: Arc<Session>,
}

impl DriveClient {
    /// Client against the production API.
    pub fn new(access_key: impl Into<String>) -> Result<Self> {
        Self::with_config(access_key, ClientConfig::default())
    }

    pub fn with_config(access_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let access_key = access_key.into();
        if access_key.is_empty() {
            return Err(DriveError::Client(
                "Missing required attribute 'access_key'.".to_string(),
            ));
        }
        let authorizer = AccessKeyAuthorizer::new(access_key)?;
        let session = Session::new(Arc::new(authorizer), config)?;
        Ok(Self::from_session(Arc::new(session)))
    }

    /// Read the access key and configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let access_key = std::env::var(ENV_ACCESS_KEY)
            .map_err(|_| DriveError::Config(format!("{ENV_ACCESS_KEY} is not set")))?;
        Self::with_config(access_key, ClientConfig::from_env()?)
    }

    /// Wrap an existing session, e.g. one with a custom transport.
    pub fn from_session(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// A lazy file stub.
    pub fn file(&self, id: impl Into<String>) -> File {
        File::stub(Arc::clone(&self.session), id)
    }

    /// A lazy folder stub.
    pub fn folder(&self, id: impl Into<String>) -> Folder {
        Folder::stub(Arc::clone(&self.session), id)
    }

    pub fn files(&self) -> FileHelper {
        FileHelper::new(Arc::clone(&self.session))
    }

    pub fn folders(&self) -> FolderHelper {
        FolderHelper::new(Arc::clone(&self.session))
    }

    pub fn search(&self) -> Search {
        Search::new(Arc::clone(&self.session))
    }

    pub fn trashcan(&self) -> Trashcan {
        Trashcan::new(Arc::clone(&self.session))
    }

    pub fn tree(&self) -> Tree {
        Tree::new(Arc::clone(&self.session))
    }

    pub fn user(&self) -> User {
        User::new(Arc::clone(&self.session))
    }

    /// Execute a route and resolve the response into a model.
    pub async fn request(&self, route: &Route, options: &RequestOptions) -> Result<Parsed> {
        self.session.request(route, options).await
    }

    /// Execute a route and return the decoded JSON body.
    pub async fn request_raw(&self, route: &Route, options: &RequestOptions) -> Result<Option<Value>> {
        self.session.request_raw(route, options).await
    }
}
