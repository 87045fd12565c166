//! Entry points for creating and referencing files and folders.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{DriveError, Result};
use crate::models::file::File;
use crate::models::folder::Folder;
use crate::routing::{endpoints, Route};
use crate::session::{RequestOptions, Session};

fn create_body(name: &str, parent_folder_id: Option<&str>) -> Value {
    let mut body = json!({ "name": name });
    if let Some(parent) = parent_folder_id {
        body["parentFolderId"] = Value::String(parent.to_string());
    }
    body
}

#[derive(Debug, Clone)]
pub struct FileHelper {
    session: Arc<Session>,
}

impl FileHelper {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// A stub for `id`. Nothing is requested until an attribute is read.
    pub fn get(&self, id: impl Into<String>) -> File {
        File::stub(Arc::clone(&self.session), id)
    }

    /// Create an empty file, in the root folder when `parent_folder_id` is `None`.
    ///
    /// The returned file carries the upload URL handed out with it, so the
    /// first [`File::upload`] skips the URL request.
    pub async fn create(&self, name: &str, parent_folder_id: Option<&str>) -> Result<File> {
        let route = Route::plain(Method::POST, endpoints::FILE_CREATE);
        let options = RequestOptions::new().json(create_body(name, parent_folder_id));
        let file = self.session.request(&route, &options).await?.into_file()?;
        debug!(file_id = %file.id(), file_name = name, "Created file");
        Ok(file)
    }

    /// Create a file and upload `content` into it.
    pub async fn create_with_content(
        &self,
        name: &str,
        parent_folder_id: Option<&str>,
        content: impl Into<Bytes>,
    ) -> Result<File> {
        let file = self.create(name, parent_folder_id).await?;
        file.upload(content).await?;
        Ok(file)
    }

    /// Create a file named after the local file and upload it.
    pub async fn upload_path(
        &self,
        path: impl AsRef<Path>,
        parent_folder_id: Option<&str>,
    ) -> Result<File> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DriveError::Client(format!(
                "File '{}' does not exist.",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                DriveError::Client(format!("Cannot derive a file name from '{}'.", path.display()))
            })?;
        let content = tokio::fs::read(path).await?;
        self.create_with_content(name, parent_folder_id, content).await
    }
}

#[derive(Debug, Clone)]
pub struct FolderHelper {
    session: Arc<Session>,
}

impl FolderHelper {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn get(&self, id: impl Into<String>) -> Folder {
        Folder::stub(Arc::clone(&self.session), id)
    }

    pub async fn create(&self, name: &str, parent_folder_id: Option<&str>) -> Result<Folder> {
        let route = Route::plain(Method::POST, endpoints::FOLDER_CREATE);
        let options = RequestOptions::new().json(create_body(name, parent_folder_id));
        let folder = self.session.request(&route, &options).await?.into_folder()?;
        debug!(folder_id = %folder.id(), folder_name = name, "Created folder");
        Ok(folder)
    }
}
