//! The account user and its plan.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::entity::{deserialize_fields, Entity, EntityKind};
use crate::models::values::{de, Plan};
use crate::session::Session;

pub struct DriveUserKind;

/// The full account user, as returned by `/user`.
pub type DriveUser = Entity<DriveUserKind>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriveUserFields {
    pub username: Option<String>,
    pub account_id: Option<String>,
    pub owner_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub updated_at: Option<Option<DateTime<Utc>>>,
    pub plan: Option<Plan>,
}

impl EntityKind for DriveUserKind {
    const NAME: &'static str = "DriveUser";
    type Fields = DriveUserFields;

    fn hydrate(raw: &Map<String, Value>, _session: &Arc<Session>) -> Result<DriveUserFields> {
        deserialize_fields::<Self, _>(raw)
    }
}

impl Entity<DriveUserKind> {
    /// Username (email).
    pub async fn username(&self) -> Result<String> {
        self.field("username", |f| f.username.clone()).await
    }

    pub async fn account_id(&self) -> Result<String> {
        self.field("account_id", |f| f.account_id.clone()).await
    }

    pub async fn owner_type(&self) -> Result<String> {
        self.field("owner_type", |f| f.owner_type.clone()).await
    }

    pub async fn created_at(&self) -> Result<DateTime<Utc>> {
        self.field("created_at", |f| f.created_at).await
    }

    pub async fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.field("updated_at", |f| f.updated_at).await
    }

    pub async fn plan(&self) -> Result<Plan> {
        self.field("plan", |f| f.plan.clone()).await
    }
}
