//! Drive folders.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{DriveError, Result};
use crate::models::entity::{deserialize_fields, Entity, EntityKind};
use crate::models::file::File;
use crate::models::helpers::FileHelper;
use crate::models::member::{Member, MembersList};
use crate::models::node::{nodes_from_array, Node};
use crate::models::values::{de, FolderType, ObjectType, PartialUser, Permissions};
use crate::routing::{endpoints, Route};
use crate::session::{RequestOptions, Session};

pub struct FolderKind;

/// A Drive folder. See [`Entity`] for the lazy loading rules.
pub type Folder = Entity<FolderKind>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderFields {
    pub name: Option<String>,
    pub folder_type: Option<FolderType>,
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
    /// Present only when the folder came from a tree listing.
    #[serde(skip)]
    pub children: Option<Vec<Node>>,
}

impl EntityKind for FolderKind {
    const NAME: &'static str = "Folder";
    type Fields = FolderFields;

    fn hydrate(raw: &Map<String, Value>, session: &Arc<Session>) -> Result<FolderFields> {
        let mut fields: FolderFields = deserialize_fields::<Self, _>(raw)?;
        if let Some(Value::Array(children)) = raw.get("children") {
            fields.children = Some(nodes_from_array(session, children)?);
        }
        Ok(fields)
    }

    fn fetch_route(id: &str) -> Result<Option<Route>> {
        Route::new(Method::GET, endpoints::FOLDER_DETAILS, [("folder_id", id)]).map(Some)
    }
}

/// Who to add to a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberIdentity {
    UserId(String),
    Username(String),
}

impl MemberIdentity {
    /// Prefers `user_id` when both are given.
    pub fn from_parts(user_id: Option<String>, username: Option<String>) -> Result<Self> {
        match (user_id, username) {
            (Some(id), _) => Ok(Self::UserId(id)),
            (None, Some(username)) => Ok(Self::Username(username)),
            (None, None) => Err(DriveError::Client(
                "Must supply `username` or `user_id`.".to_string(),
            )),
        }
    }
}

impl Entity<FolderKind> {
    pub async fn name(&self) -> Result<String> {
        self.field("name", |f| f.name.clone()).await
    }

    pub async fn folder_type(&self) -> Result<FolderType> {
        self.field("folder_type", |f| f.folder_type).await
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

    pub async fn permissions(&self) -> Result<Permissions> {
        self.field("permissions", |f| f.permissions.clone()).await
    }

    pub async fn created_at(&self) -> Result<DateTime<Utc>> {
        self.field("created_at", |f| f.created_at).await
    }

    pub async fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.field("updated_at", |f| f.updated_at).await
    }

    pub async fn shared_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.field("shared_at", |f| f.shared_at).await
    }

    pub async fn object_type(&self) -> Result<ObjectType> {
        self.field("type", |f| f.object_type).await
    }

    /// Children returned by a tree listing. Never fetches.
    pub fn children(&self) -> Option<Vec<Node>> {
        self.peek(|f| f.children.clone())
    }

    pub async fn members(&self) -> Result<MembersList> {
        let route = Route::new(Method::GET, endpoints::FOLDER_MEMBERS, [("folder_id", self.id())])?;
        let mut members = self
            .session()
            .request(&route, &RequestOptions::new())
            .await?
            .into_members_list()?;
        members.set_parent(Node::Folder(self.clone()));
        Ok(members)
    }

    /// Share the folder with an existing or new user.
    pub async fn add_member(&self, identity: MemberIdentity, edit_access: bool) -> Result<Member> {
        let mut body = json!({ "permissions": Permissions::grant(edit_access) });
        match identity {
            MemberIdentity::UserId(id) => body["id"] = Value::String(id),
            MemberIdentity::Username(username) => body["username"] = Value::String(username),
        }

        let route = Route::new(Method::POST, endpoints::FOLDER_MEMBERS, [("folder_id", self.id())])?;
        self.session()
            .request(&route, &RequestOptions::new().json(body))
            .await?
            .into_member()
    }

    pub async fn remove_member(&self, user_id: &str) -> Result<()> {
        let route = self.member_route(Method::DELETE, user_id)?;
        self.session().request_raw(&route, &RequestOptions::new()).await?;
        Ok(())
    }

    pub async fn modify_member(&self, user_id: &str, edit_access: bool) -> Result<Member> {
        let route = self.member_route(Method::PUT, user_id)?;
        let body = json!({ "permissions": Permissions::grant(edit_access) });
        self.session()
            .request(&route, &RequestOptions::new().json(body))
            .await?
            .into_member()
    }

    pub async fn move_to(&self, parent_folder_id: &str) -> Result<()> {
        self.update_details(json!({ "parentFolderId": parent_folder_id }))
            .await?;
        self.set_attribute("parent_folder_id", json!(parent_folder_id))
    }

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

    /// Create a file in this folder and upload its contents.
    pub async fn upload(&self, file_name: &str, content: impl Into<Bytes>) -> Result<File> {
        FileHelper::new(Arc::clone(self.session()))
            .create_with_content(file_name, Some(self.id()), content)
            .await
    }

    fn member_route(&self, method: Method, user_id: &str) -> Result<Route> {
        Route::new(
            method,
            endpoints::FOLDER_MEMBER,
            [("folder_id", self.id()), ("member_id", user_id)],
        )
    }

    async fn update_details(&self, body: Value) -> Result<()> {
        let route = Route::new(Method::PUT, endpoints::FOLDER_DETAILS, [("folder_id", self.id())])?;
        self.session()
            .request_raw(&route, &RequestOptions::new().json(body))
            .await?;
        Ok(())
    }
}
