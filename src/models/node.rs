//! A tree node that is either a file or a folder.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::file::File;
use crate::models::folder::Folder;
use crate::models::values::ObjectType;
use crate::session::Session;

/// A file or a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    File(File),
    Folder(Folder),
}

impl Node {
    /// Build from snake_cased data by its `type` tag. Other tags yield `None`.
    pub fn from_data(session: &Arc<Session>, data: Map<String, Value>) -> Result<Option<Self>> {
        match data.get("type").and_then(Value::as_str) {
            Some("FILE") => Ok(Some(Node::File(File::from_data(Arc::clone(session), data)?))),
            Some("FOLDER") => Ok(Some(Node::Folder(Folder::from_data(Arc::clone(session), data)?))),
            _ => Ok(None),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Node::File(file) => file.id(),
            Node::Folder(folder) => folder.id(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Node::File(_) => ObjectType::File,
            Node::Folder(_) => ObjectType::Folder,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Node::File(file) => Some(file),
            Node::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Node::Folder(folder) => Some(folder),
            Node::File(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }
}

impl From<File> for Node {
    fn from(file: File) -> Self {
        Node::File(file)
    }
}

impl From<Folder> for Node {
    fn from(folder: Folder) -> Self {
        Node::Folder(folder)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Build every child that carries a known `type` tag.
pub(crate) fn nodes_from_array(session: &Arc<Session>, items: &[Value]) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(items.len());
    for item in items {
        if let Value::Object(map) = item {
            if let Some(node) = Node::from_data(session, map.clone())? {
                nodes.push(node);
            }
        }
    }
    Ok(nodes)
}
