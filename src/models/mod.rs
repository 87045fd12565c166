//! Drive objects and the machinery that builds them from responses.

pub mod account;
pub mod entity;
pub mod file;
pub mod folder;
pub mod helpers;
pub mod member;
pub mod node;
pub mod paginator;
pub mod parser;
pub mod search;
pub mod trash;
pub mod trashcan;
pub mod tree;
pub mod user;
pub mod values;

pub use account::User;
pub use entity::{Entity, EntityKind, Fetchable};
pub use file::File;
pub use folder::{Folder, MemberIdentity};
pub use helpers::{FileHelper, FolderHelper};
pub use member::{Member, MembersList};
pub use node::Node;
pub use paginator::{PageMeta, PaginatedList, PaginatedListGenerator, TrashPaginatedList};
pub use parser::{Model, Parsed, Parser};
pub use search::{Search, SearchQuery};
pub use trash::Trash;
pub use trashcan::Trashcan;
pub use tree::{Tree, TreeOptions};
pub use user::DriveUser;
pub use values::{
    format_size, FolderType, ObjectType, PartialUser, Permissions, Plan, SharingType, Usage,
};
