//! Folder and file members and their permissions.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DriveError, Result};
use crate::models::entity::{deserialize_fields, Entity, EntityKind};
use crate::models::node::Node;
use crate::models::parser::Model;
use crate::models::values::Permissions;
use crate::session::Session;

pub struct MemberKind;

/// A user with access to a file or folder, with their permissions on it.
pub type Member = Entity<MemberKind>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFields {
    pub username: Option<String>,
    pub permissions: Option<Permissions>,
}

impl EntityKind for MemberKind {
    const NAME: &'static str = "Member";
    type Fields = MemberFields;

    fn hydrate(raw: &Map<String, Value>, _session: &Arc<Session>) -> Result<MemberFields> {
        deserialize_fields::<Self, _>(raw)
    }
}

impl Entity<MemberKind> {
    pub async fn username(&self) -> Result<String> {
        self.field("username", |f| f.username.clone()).await
    }

    pub async fn permissions(&self) -> Result<Permissions> {
        self.field("permissions", |f| f.permissions.clone()).await
    }
}

/// Members of a file or folder.
#[derive(Debug, Clone, Default)]
pub struct MembersList {
    members: Vec<Member>,
    parent: Option<Node>,
}

impl MembersList {
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    /// Whether a member with this id is in the list.
    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|member| member == id)
    }

    /// The file or folder the list was requested for.
    pub fn parent(&self) -> Option<&Node> {
        self.parent.as_ref()
    }

    pub fn set_parent(&mut self, parent: Node) {
        self.parent = Some(parent);
    }
}

impl Model for MembersList {
    fn parse(mut data: Map<String, Value>, session: &Arc<Session>) -> Result<Self> {
        let items = match data.remove("members") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(DriveError::Validation(format!(
                    "MembersList: expected an array of members, got {other}"
                )));
            }
        };

        let members = items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Member::from_data(Arc::clone(session), map),
                other => Err(DriveError::Validation(format!(
                    "MembersList: expected a member object, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            members,
            parent: None,
        })
    }
}

impl IntoIterator for MembersList {
    type Item = Member;
    type IntoIter = std::vec::IntoIter<Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a MembersList {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
