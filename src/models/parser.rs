//! Resolves response JSON into models by its shape.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::casing::snake_case_map;
use crate::error::{ApiError, DriveError, Result};
use crate::models::entity::{Entity, EntityKind};
use crate::models::file::File;
use crate::models::folder::Folder;
use crate::models::member::{Member, MembersList};
use crate::models::paginator::{PaginatedList, TrashPaginatedList};
use crate::models::trash::Trash;
use crate::models::user::DriveUser;
use crate::session::Session;

/// Construction from a snake_cased response object.
pub trait Model: Sized {
    fn parse(data: Map<String, Value>, session: &Arc<Session>) -> Result<Self>;
}

impl<K: EntityKind> Model for Entity<K> {
    fn parse(data: Map<String, Value>, session: &Arc<Session>) -> Result<Self> {
        Entity::from_data(Arc::clone(session), data)
    }
}

/// A parsed response.
#[derive(Debug, Clone)]
pub enum Parsed {
    None,
    Scalar(Value),
    List(Vec<Parsed>),
    File(File),
    Folder(Folder),
    MembersList(MembersList),
    Member(Member),
    PaginatedList(PaginatedList),
    TrashPaginatedList(TrashPaginatedList),
    Trash(Trash),
    DriveUser(DriveUser),
    /// An object no model matched, with snake_cased keys.
    Unknown(Map<String, Value>),
}

macro_rules! into_variant {
    ($($method:ident => $variant:ident($ty:ty)),* $(,)?) => {
        $(
            pub fn $method(self) -> Result<$ty> {
                match self {
                    Parsed::$variant(value) => Ok(value),
                    other => Err(DriveError::UnexpectedModel {
                        expected: stringify!($variant),
                        found: other.kind(),
                    }),
                }
            }
        )*
    };
}

impl Parsed {
    pub fn kind(&self) -> &'static str {
        match self {
            Parsed::None => "None",
            Parsed::Scalar(_) => "Scalar",
            Parsed::List(_) => "List",
            Parsed::File(_) => "File",
            Parsed::Folder(_) => "Folder",
            Parsed::MembersList(_) => "MembersList",
            Parsed::Member(_) => "Member",
            Parsed::PaginatedList(_) => "PaginatedList",
            Parsed::TrashPaginatedList(_) => "TrashPaginatedList",
            Parsed::Trash(_) => "Trash",
            Parsed::DriveUser(_) => "DriveUser",
            Parsed::Unknown(_) => "Unknown",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Parsed::None)
    }

    into_variant! {
        into_file => File(File),
        into_folder => Folder(Folder),
        into_members_list => MembersList(MembersList),
        into_member => Member(Member),
        into_paginated_list => PaginatedList(PaginatedList),
        into_trash_paginated_list => TrashPaginatedList(TrashPaginatedList),
        into_trash => Trash(Trash),
        into_drive_user => DriveUser(DriveUser),
        into_list => List(Vec<Parsed>),
        into_unknown => Unknown(Map<String, Value>),
    }
}

type Data = Map<String, Value>;

/// One row of the dispatch table.
struct Rule {
    name: &'static str,
    matches: fn(&Data) -> bool,
    /// Reshape the data before building.
    prepare: Option<fn(Data) -> Result<Data>>,
    build: fn(Data, &Arc<Session>) -> Result<Parsed>,
}

/// Checked in order; the first match wins.
static RULES: [Rule; 10] = [
    Rule {
        name: "File",
        matches: is_file,
        prepare: None,
        build: build_file,
    },
    Rule {
        name: "Folder",
        matches: is_folder,
        prepare: None,
        build: build_folder,
    },
    Rule {
        name: "MembersList",
        matches: has_members,
        prepare: None,
        build: build_members_list,
    },
    Rule {
        name: "Member",
        matches: is_member,
        prepare: None,
        build: build_member,
    },
    Rule {
        name: "File",
        matches: is_file_with_upload_url,
        prepare: Some(merge_upload_url),
        build: build_file,
    },
    Rule {
        name: "TrashPaginatedList",
        matches: is_trash_page,
        prepare: None,
        build: build_trash_page,
    },
    Rule {
        name: "PaginatedList",
        matches: is_page,
        prepare: None,
        build: build_page,
    },
    Rule {
        name: "Trash",
        matches: is_trash,
        prepare: None,
        build: build_trash,
    },
    Rule {
        name: "DriveUser",
        matches: is_drive_user,
        prepare: None,
        build: build_drive_user,
    },
    Rule {
        name: "Folder",
        matches: is_tree,
        prepare: Some(unwrap_tree),
        build: build_folder,
    },
];

fn has_all(data: &Data, keys: &[&str]) -> bool {
    keys.iter().all(|key| data.contains_key(*key))
}

fn type_is(data: &Data, tag: &str) -> bool {
    data.get("type").and_then(Value::as_str) == Some(tag)
}

fn is_file(data: &Data) -> bool {
    type_is(data, "FILE")
}

fn is_folder(data: &Data) -> bool {
    type_is(data, "FOLDER")
}

fn has_members(data: &Data) -> bool {
    data.contains_key("members")
}

fn is_member(data: &Data) -> bool {
    has_all(data, &["id", "username", "permissions"])
}

fn is_file_with_upload_url(data: &Data) -> bool {
    has_all(data, &["file", "upload_url"])
}

fn is_trash_page(data: &Data) -> bool {
    has_all(data, &["meta", "trash"])
}

fn is_page(data: &Data) -> bool {
    data.contains_key("meta")
}

fn is_trash(data: &Data) -> bool {
    data.contains_key("trasher")
}

fn is_drive_user(data: &Data) -> bool {
    has_all(data, &["account_id", "owner_type", "plan"])
}

fn is_tree(data: &Data) -> bool {
    data.contains_key("tree")
}

/// `{file, upload_url}` becomes the file with `_upload_url` set.
fn merge_upload_url(mut data: Data) -> Result<Data> {
    let upload_url = data.remove("upload_url").unwrap_or(Value::Null);
    match data.remove("file") {
        Some(Value::Object(mut file)) => {
            file.insert("_upload_url".to_string(), upload_url);
            Ok(file)
        }
        other => Err(DriveError::Validation(format!(
            "expected 'file' to be an object, got {other:?}"
        ))),
    }
}

fn unwrap_tree(mut data: Data) -> Result<Data> {
    match data.remove("tree") {
        Some(Value::Object(tree)) => Ok(tree),
        other => Err(DriveError::Validation(format!(
            "expected 'tree' to be an object, got {other:?}"
        ))),
    }
}

fn build_file(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    File::parse(data, session).map(Parsed::File)
}

fn build_folder(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    Folder::parse(data, session).map(Parsed::Folder)
}

fn build_members_list(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    MembersList::parse(data, session).map(Parsed::MembersList)
}

fn build_member(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    Member::parse(data, session).map(Parsed::Member)
}

fn build_trash_page(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    TrashPaginatedList::parse(data, session).map(Parsed::TrashPaginatedList)
}

fn build_page(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    PaginatedList::parse(data, session).map(Parsed::PaginatedList)
}

fn build_trash(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    Trash::parse(data, session).map(Parsed::Trash)
}

fn build_drive_user(data: Data, session: &Arc<Session>) -> Result<Parsed> {
    DriveUser::parse(data, session).map(Parsed::DriveUser)
}

/// Turns response JSON into [`Parsed`] values bound to a session.
#[derive(Debug, Clone)]
pub struct Parser {
    session: Arc<Session>,
}

impl Parser {
    pub fn new(session: &Arc<Session>) -> Self {
        Self {
            session: Arc::clone(session),
        }
    }

    pub fn parse(&self, data: Option<Value>) -> Result<Parsed> {
        match data {
            None | Some(Value::Null) => Ok(Parsed::None),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| self.parse(Some(item)))
                .collect::<Result<Vec<_>>>()
                .map(Parsed::List),
            Some(Value::Object(map)) => self.parse_object(map),
            Some(scalar) => Ok(Parsed::Scalar(scalar)),
        }
    }

    fn parse_object(&self, data: Data) -> Result<Parsed> {
        if data.contains_key("errorCode") {
            let body = Value::Object(data.clone());
            if let Some(error) = ApiError::from_body(&body, &HeaderMap::new(), None) {
                return Err(DriveError::Api(error));
            }
        }
        self.resolve(snake_case_map(data))
    }

    fn resolve(&self, data: Data) -> Result<Parsed> {
        let Some(rule) = RULES.iter().find(|rule| (rule.matches)(&data)) else {
            debug!(keys = ?data.keys().collect::<Vec<_>>(), "No model matched");
            return Ok(Parsed::Unknown(data));
        };

        debug!(model = rule.name, "Detected model");
        let data = match rule.prepare {
            Some(prepare) => prepare(data)?,
            None => data,
        };
        (rule.build)(data, &self.session)
    }
}
