//! Drive files.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::casing::snake_case_keys;
use crate::error::{DriveError, Result};
use crate::models::entity::{deserialize_fields, Entity, EntityKind};
use crate::models::member::{Member, MembersList};
use crate::models::node::Node;
use crate::models::values::{de, ObjectType, PartialUser, Permissions};
use crate::routing::{endpoints, Route};
use crate::session::{RequestOptions, Session};

pub struct FileKind;

/// A Drive file. See [`Entity`] for the lazy loading rules.
pub type File = Entity<FileKind>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileFields {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bytes")]
    pub bytes: Option<u64>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub file_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub upload_state: Option<Option<String>>,
    pub owner: Option<PartialUser>,
    pub creator: Option<PartialUser>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub parent_folder_id: Option<Option<String>>,
    pub permissions: Option<Permissions>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub updated_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub shared_at: Option<Option<DateTime<Utc>>>,
    #[serde(rename = "type")]
    pub object_type: Option<ObjectType>,
    /// Storage URL handed out with a freshly created file.
    #[serde(rename = "_upload_url")]
    pub upload_url: Option<String>,
}

impl EntityKind for FileKind {
    const NAME: &'static str = "File";
    type Fields = FileFields;

    fn hydrate(raw: &Map<String, Value>, _session: &Arc<Session>) -> Result<FileFields> {
        deserialize_fields::<Self, _>(raw)
    }

    fn fetch_route(id: &str) -> Result<Option<Route>> {
        Route::new(Method::GET, endpoints::FILE_DETAILS, [("file_id", id)]).map(Some)
    }
}

impl Entity<FileKind> {
    pub async fn name(&self) -> Result<String> {
        self.field("name", |f| f.name.clone()).await
    }

    /// Size in bytes.
    pub async fn bytes(&self) -> Result<u64> {
        self.field("bytes", |f| f.bytes).await
    }

    /// File type such as `JPG` or `WFM`.
    pub async fn file_type(&self) -> Result<Option<String>> {
        self.field("file_type", |f| f.file_type.clone()).await
    }

    pub async fn upload_state(&self) -> Result<Option<String>> {
        self.field("upload_state", |f| f.upload_state.clone()).await
    }

    pub async fn owner(&self) -> Result<PartialUser> {
        self.field("owner", |f| f.owner.clone()).await
    }

    pub async fn creator(&self) -> Result<PartialUser> {
        self.field("creator", |f| f.creator.clone()).await
    }

    pub async fn parent_folder_id(&self) -> Result<Option<String>> {
        self.field("parent_folder_id", |f| f.parent_folder_id.clone()).await
    }

    /// Permissions of the requesting user.
    pub async fn permissions(&self) -> Result<Permissions> {
        self.field("permissions", |f| f.permissions.clone()).await
    }

    pub async fn created_at(&self) -> Result<DateTime<Utc>> {
        self.field("created_at", |f| f.created_at).await
    }

    pub async fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.field("updated_at", |f| f.updated_at).await
    }

    /// When the file was shared with the requesting user. `None` with direct access.
    pub async fn shared_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.field("shared_at", |f| f.shared_at).await
    }

    pub async fn object_type(&self) -> Result<ObjectType> {
        self.field("type", |f| f.object_type).await
    }

    /// The cached upload URL. Never fetched.
    pub async fn upload_url(&self) -> Result<String> {
        self.field("_upload_url", |f| f.upload_url.clone()).await
    }

    pub async fn members(&self) -> Result<MembersList> {
        let route = Route::new(Method::GET, endpoints::FILE_MEMBERS, [("file_id", self.id())])?;
        let mut members = self
            .session()
            .request(&route, &RequestOptions::new())
            .await?
            .into_members_list()?;
        members.set_parent(Node::File(self.clone()));
        Ok(members)
    }

    /// Share the file with an existing or new user.
    pub async fn share(&self, username: &str, edit_access: bool) -> Result<Member> {
        let route = Route::new(Method::POST, endpoints::FILE_MEMBERS, [("file_id", self.id())])?;
        let body = json!({
            "username": username,
            "permissions": Permissions::grant(edit_access),
        });
        self.session()
            .request(&route, &RequestOptions::new().json(body))
            .await?
            .into_member()
    }

    /// Move into another folder.
    pub async fn move_to(&self, parent_folder_id: &str) -> Result<()> {
        self.update_details(json!({ "parentFolderId": parent_folder_id }))
            .await?;
        self.set_attribute("parent_folder_id", json!(parent_folder_id))
    }

    /// Change the name locally. Call [`save`](Self::save) to persist it.
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        self.set_attribute("name", Value::String(name.into()))
    }

    /// Persist metadata changes. Only `name` is supported.
    pub async fn save(&self) -> Result<()> {
        let name = self.name().await?;
        self.update_details(json!({ "name": name })).await
    }

    pub async fn rename(&self, name: impl Into<String>) -> Result<()> {
        self.set_name(name)?;
        self.save().await
    }

    /// Replace the file contents.
    pub async fn upload(&self, content: impl Into<Bytes>) -> Result<()> {
        let cached = self.peek(|f| f.upload_url.clone());
        let url = match &cached {
            Some(url) => url.clone(),
            None => self.fetch_storage_url(endpoints::FILE_UPLOAD, "upload_url").await?,
        };
        debug!(file_id = %self.id(), "Uploading file contents");
        self.session().storage_put(&url, content.into()).await?;
        // The handed-out URL is single use once the PUT succeeds.
        if cached.is_some() {
            self.remove_attribute("_upload_url")?;
        }
        Ok(())
    }

    /// Replace the file contents with a local file.
    pub async fn upload_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DriveError::Client(format!(
                "File '{}' does not exist.",
                path.display()
            )));
        }
        let content = tokio::fs::read(path).await?;
        self.upload(content).await
    }

    /// Download the file contents.
    pub async fn download(&self) -> Result<Bytes> {
        let url = self
            .fetch_storage_url(endpoints::FILE_DOWNLOAD, "download_url")
            .await?;
        debug!(file_id = %self.id(), "Downloading file contents");
        self.session().storage_get(&url).await
    }

    /// Download the file contents into a local file, replacing it.
    pub async fn download_to(&self, path: impl AsRef<Path>) -> Result<u64> {
        let content = self.download().await?;
        let mut file = tokio::fs::File::create(path.as_ref()).await?;
        file.write_all(&content).await?;
        file.flush().await?;
        Ok(content.len() as u64)
    }

    async fn fetch_storage_url(&self, template: &'static str, key: &str) -> Result<String> {
        let route = Route::new(Method::GET, template, [("file_id", self.id())])?;
        let data = self
            .session()
            .request_raw(&route, &RequestOptions::new())
            .await?
            .map(snake_case_keys);

        data.as_ref()
            .and_then(|d| d.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DriveError::Validation(format!("response did not contain '{key}'")))
    }

    async fn update_details(&self, body: Value) -> Result<()> {
        let route = Route::new(Method::PUT, endpoints::FILE_DETAILS, [("file_id", self.id())])?;
        self.session()
            .request_raw(&route, &RequestOptions::new().json(body))
            .await?;
        Ok(())
    }
}
