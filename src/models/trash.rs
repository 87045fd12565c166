//! Trashed files and folders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::entity::{deserialize_fields, Entity, EntityKind};
use crate::models::node::Node;
use crate::models::values::{de, PartialUser};
use crate::session::Session;

pub struct TrashKind;

/// A file or folder placed in the trashcan.
///
/// The API sends no id for trash entries. One is derived from the item as
/// `trash_<item id>`, so a file and a folder sharing an id would collide.
pub type Trash = Entity<TrashKind>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrashFields {
    pub trasher: Option<PartialUser>,
    pub trashed_at: Option<DateTime<Utc>>,
    /// Whether the item was trashed itself rather than through a parent folder.
    pub trashed_directly: Option<bool>,
    /// For folders, the sum over the folder contents.
    #[serde(default, deserialize_with = "de::opt_bytes")]
    pub total_bytes: Option<u64>,
    pub item_share_count: Option<u64>,
    #[serde(skip)]
    pub item: Option<Node>,
}

impl EntityKind for TrashKind {
    const NAME: &'static str = "Trash";
    type Fields = TrashFields;

    fn hydrate(raw: &Map<String, Value>, session: &Arc<Session>) -> Result<TrashFields> {
        let mut fields: TrashFields = deserialize_fields::<Self, _>(raw)?;
        if let Some(Value::Object(item)) = raw.get("item") {
            fields.item = Node::from_data(session, item.clone())?;
        }
        Ok(fields)
    }

    fn prepare(mut data: Map<String, Value>) -> Result<Map<String, Value>> {
        if !data.contains_key("id") {
            let item_id = data
                .get("item")
                .and_then(|item| item.get("id"))
                .and_then(Value::as_str)
                .map(|id| format!("trash_{id}"));
            if let Some(id) = item_id {
                data.insert("id".to_string(), Value::String(id));
            }
        }
        Ok(data)
    }
}

impl Entity<TrashKind> {
    pub async fn trasher(&self) -> Result<PartialUser> {
        self.field("trasher", |f| f.trasher.clone()).await
    }

    pub async fn trashed_at(&self) -> Result<DateTime<Utc>> {
        self.field("trashed_at", |f| f.trashed_at).await
    }

    pub async fn trashed_directly(&self) -> Result<bool> {
        self.field("trashed_directly", |f| f.trashed_directly).await
    }

    pub async fn total_bytes(&self) -> Result<u64> {
        self.field("total_bytes", |f| f.total_bytes).await
    }

    pub async fn item_share_count(&self) -> Result<u64> {
        self.field("item_share_count", |f| f.item_share_count).await
    }

    pub async fn item(&self) -> Result<Node> {
        self.field("item", |f| f.item.clone()).await
    }
}
