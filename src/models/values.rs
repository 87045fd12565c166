//! Plain value objects carried by entities.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Permissions the requesting user holds on a file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub read: bool,
    pub edit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

impl Permissions {
    /// Read access, plus edit access when `edit` is set.
    pub fn grant(edit: bool) -> Self {
        Self {
            read: true,
            edit,
            owner: None,
            creator: None,
            public: None,
        }
    }
}

/// The id/username pair embedded as owner, creator or trasher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    File,
    Folder,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::File => "FILE",
            ObjectType::Folder => "FOLDER",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FolderType {
    Standard,
    Personal,
    Shares,
    #[serde(other)]
    Unknown,
}

/// How far a plan allows sharing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharingType {
    Unlimited,
    PermissionsLimited,
    Disabled,
}

impl SharingType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UNLIMITED" => Some(Self::Unlimited),
            "PERMISSIONS_LIMITED" => Some(Self::PermissionsLimited),
            "DISABLED" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Account plan. The typed limits are derived from the raw `limits` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub limits: Map<String, Value>,
    pub access_key_limit: Option<u64>,
    /// Bytes.
    pub storage_limit: u64,
    pub sharing_type: SharingType,
}

#[derive(Deserialize)]
struct RawPlan {
    id: String,
    name: String,
    #[serde(default)]
    limits: Map<String, Value>,
}

#[derive(Deserialize)]
struct PlanLimits {
    #[serde(default)]
    access_key_limit: Option<u64>,
    #[serde(deserialize_with = "de::bytes")]
    storage_size_limit: u64,
    sharing_type: Option<String>,
}

impl TryFrom<RawPlan> for Plan {
    type Error = String;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        let limits: PlanLimits = serde_json::from_value(Value::Object(raw.limits.clone()))
            .map_err(|e| format!("invalid plan limits: {e}"))?;
        let sharing_type = match limits.sharing_type.as_deref() {
            Some(value) => SharingType::parse(value)
                .ok_or_else(|| format!("unknown sharing type '{value}'"))?,
            None => return Err("plan limits are missing 'sharing_type'".to_string()),
        };

        Ok(Self {
            id: raw.id,
            name: raw.name,
            limits: raw.limits,
            access_key_limit: limits.access_key_limit,
            storage_limit: limits.storage_size_limit,
            sharing_type,
        })
    }
}

/// Account storage statistics. Byte counts are decoded from strings or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(deserialize_with = "de::bytes")]
    pub total_bytes_owned: u64,
    pub files_owned_count: u64,
    #[serde(deserialize_with = "de::bytes")]
    pub total_bytes_owned_in_trash: u64,
    pub files_owned_in_trash_count: u64,
    #[serde(deserialize_with = "de::bytes")]
    pub total_bytes_created: u64,
    pub files_created_count: u64,
    #[serde(deserialize_with = "de::bytes")]
    pub storage_size_limit: u64,
}

impl Usage {
    pub fn storage_limit(&self) -> u64 {
        self.storage_size_limit
    }

    /// Bytes counting against the storage limit.
    pub fn storage_used(&self) -> u64 {
        self.total_bytes_owned
    }

    /// Bytes in the trash that emptying it would free.
    pub fn storage_freeable(&self) -> u64 {
        self.total_bytes_owned_in_trash
    }

    /// `limit - used`. Negative when the account is over its limit.
    pub fn storage_remaining(&self) -> i64 {
        self.storage_limit() as i64 - self.storage_used() as i64
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Field deserializers for the wire's loose typing.
pub(crate) mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_bytes<E: Error>(value: Value) -> Result<u64, E> {
        match value {
            Value::String(s) => s.trim().parse::<u64>().map_err(E::custom),
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .ok_or_else(|| E::custom(format!("invalid byte count {n}"))),
            other => Err(E::custom(format!("expected a byte count, got {other}"))),
        }
    }

    /// A byte count sent either as a JSON string or a number.
    pub fn bytes<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        to_bytes(Value::deserialize(deserializer)?)
    }

    pub fn opt_bytes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Null) | None => Ok(None),
            Some(value) => to_bytes(value).map(Some),
        }
    }

    /// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
    /// Use together with `#[serde(default)]`.
    pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
