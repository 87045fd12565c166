//! Lazily fetched entity handles.
//!
//! An [`Entity`] starts either as a stub (id only) or hydrated from a server
//! response. Reading an attribute that is absent from a stub fetches the
//! entity once and reads again. Handles are cheap to clone and every clone
//! observes the same state, so a fetch or [`Entity::refresh`] through one
//! handle is visible through all of them.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::casing::snake_case_map;
use crate::error::{ApiError, DriveError, Result};
use crate::routing::Route;
use crate::session::{RequestOptions, Session};

/// Per-type behavior of an entity.
pub trait EntityKind: Send + Sync + 'static {
    /// Type name used in errors, `Debug` output and hashing.
    const NAME: &'static str;

    /// Typed attributes, coerced once from the snake_cased wire map.
    type Fields: Default + Send + Sync + 'static;

    fn hydrate(raw: &Map<String, Value>, session: &Arc<Session>) -> Result<Self::Fields>;

    /// Route that returns this entity's details. `None` when the API has no
    /// standalone lookup for the type.
    fn fetch_route(_id: &str) -> Result<Option<Route>> {
        Ok(None)
    }

    /// Adjust raw data before the id is read from it.
    fn prepare(data: Map<String, Value>) -> Result<Map<String, Value>> {
        Ok(data)
    }
}

/// Deserialize typed fields, reporting failures as validation errors.
pub(crate) fn deserialize_fields<K: EntityKind, T: DeserializeOwned>(raw: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(raw.clone()))
        .map_err(|e| DriveError::Validation(format!("{}: {e}", K::NAME)))
}

/// Explicit lazy loading.
#[async_trait]
pub trait Fetchable {
    fn is_fetched(&self) -> bool;

    /// Load attributes from the server, replacing whatever is held.
    async fn fetch(&self) -> Result<()>;
}

struct State<K: EntityKind> {
    fetched: bool,
    fields: K::Fields,
    raw: Map<String, Value>,
}

struct Shared<K: EntityKind> {
    id: String,
    session: Arc<Session>,
    state: RwLock<State<K>>,
    _kind: PhantomData<K>,
}

/// Shared handle to a lazily fetched API object.
pub struct Entity<K: EntityKind> {
    shared: Arc<Shared<K>>,
}

impl<K: EntityKind> Clone for Entity<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: EntityKind> Entity<K> {
    /// Build from an id, from response data, or both.
    ///
    /// Data alone counts as fetched. With an id, missing attributes still
    /// trigger a fetch.
    pub fn new(session: Arc<Session>, id: Option<String>, data: Option<Map<String, Value>>) -> Result<Self> {
        let (id, fetched, raw) = match (id, data) {
            (None, None) => {
                return Err(DriveError::Client("Must supply `id` or `data`.".to_string()));
            }
            (Some(id), None) => (id, false, Map::new()),
            (id, Some(data)) => {
                let data = K::prepare(data)?;
                let fetched = id.is_none();
                let id = match id {
                    Some(id) => id,
                    None => data
                        .get("id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            DriveError::Client("An invalid value was specified for `id`.".to_string())
                        })?,
                };
                (id, fetched, data)
            }
        };

        let fields = if raw.is_empty() {
            K::Fields::default()
        } else {
            K::hydrate(&raw, &session)?
        };

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                session,
                state: RwLock::new(State { fetched, fields, raw }),
                _kind: PhantomData,
            }),
        })
    }

    /// A stub holding only the id.
    pub fn stub(session: Arc<Session>, id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                session,
                state: RwLock::new(State {
                    fetched: false,
                    fields: K::Fields::default(),
                    raw: Map::new(),
                }),
                _kind: PhantomData,
            }),
        }
    }

    /// A hydrated entity built from snake_cased response data.
    pub fn from_data(session: Arc<Session>, data: Map<String, Value>) -> Result<Self> {
        Self::new(session, None, Some(data))
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.shared.session
    }

    /// Whether two handles share the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Snapshot of the raw snake_cased attributes.
    pub fn raw(&self) -> Map<String, Value> {
        self.read(|state| state.raw.clone())
    }

    /// Look up an attribute by its snake_case name.
    pub async fn attribute(&self, name: &str) -> Result<Value> {
        self.lookup(name, |state| state.raw.get(name).cloned()).await
    }

    /// Set a raw attribute and re-derive the typed fields.
    pub fn set_attribute(&self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        self.rewrite(|raw| {
            raw.insert(name, value);
        })
    }

    pub fn remove_attribute(&self, name: &str) -> Result<()> {
        self.rewrite(|raw| {
            raw.remove(name);
        })
    }

    /// Fetch again and replace every attribute in place.
    pub async fn refresh(&self) -> Result<()> {
        self.fetch().await
    }

    /// Typed attribute lookup with the same lazy rules as [`Entity::attribute`].
    pub(crate) async fn field<T>(&self, name: &str, get: impl Fn(&K::Fields) -> Option<T>) -> Result<T> {
        self.lookup(name, |state| get(&state.fields)).await
    }

    /// Typed read that never fetches.
    pub(crate) fn peek<T>(&self, get: impl FnOnce(&K::Fields) -> T) -> T {
        self.read(|state| get(&state.fields))
    }

    async fn lookup<T>(&self, name: &str, get: impl Fn(&State<K>) -> Option<T>) -> Result<T> {
        if let Some(value) = self.read(&get) {
            return Ok(value);
        }
        if name.starts_with('_') || self.is_fetched() {
            return Err(self.missing(name));
        }

        self.fetch().await?;
        self.read(&get).ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> DriveError {
        DriveError::MissingAttribute {
            entity: K::NAME,
            attribute: name.to_string(),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&State<K>) -> T) -> T {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut State<K>) -> T) -> T {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    fn rewrite(&self, edit: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let mut raw = self.raw();
        edit(&mut raw);
        let fields = K::hydrate(&raw, self.session())?;
        self.write(|state| {
            state.raw = raw;
            state.fields = fields;
        });
        Ok(())
    }

    fn replace(&self, data: Map<String, Value>) -> Result<()> {
        let raw = K::prepare(data)?;
        let fields = K::hydrate(&raw, self.session())?;
        self.write(|state| {
            state.raw = raw;
            state.fields = fields;
            state.fetched = true;
        });
        Ok(())
    }
}

#[async_trait]
impl<K: EntityKind> Fetchable for Entity<K> {
    fn is_fetched(&self) -> bool {
        self.read(|state| state.fetched)
    }

    async fn fetch(&self) -> Result<()> {
        let Some(route) = K::fetch_route(self.id())? else {
            self.write(|state| state.fetched = true);
            return Ok(());
        };

        debug!(entity = K::NAME, id = %self.id(), "Fetching");
        let data = self.session().request_raw(&route, &RequestOptions::new()).await?;
        match data {
            Some(Value::Object(map)) => {
                if map.contains_key("errorCode") {
                    let body = Value::Object(map.clone());
                    if let Some(error) = ApiError::from_body(&body, &HeaderMap::new(), None) {
                        return Err(DriveError::Api(error));
                    }
                }
                self.replace(snake_case_map(map))
            }
            other => Err(DriveError::Validation(format!(
                "{} details for '{}' were not an object: {other:?}",
                K::NAME,
                self.id()
            ))),
        }
    }
}

impl<K: EntityKind> PartialEq for Entity<K> {
    fn eq(&self, other: &Self) -> bool {
        self == other.id()
    }
}

impl<K: EntityKind> Eq for Entity<K> {}

impl<K: EntityKind> PartialEq<str> for Entity<K> {
    fn eq(&self, other: &str) -> bool {
        self.id().to_lowercase() == other.to_lowercase()
    }
}

impl<K: EntityKind> PartialEq<&str> for Entity<K> {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl<K: EntityKind> PartialEq<String> for Entity<K> {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

impl<K: EntityKind> Hash for Entity<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(hash_one(K::NAME) ^ hash_one(&self.id().to_lowercase()));
    }
}

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl<K: EntityKind> fmt::Display for Entity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl<K: EntityKind> fmt::Debug for Entity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::NAME).field("id", &self.id()).finish()
    }
}
