//! Paginated listings and the generator that walks them.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{DriveError, Result};
use crate::models::parser::{Model, Parsed, Parser};
use crate::routing::Route;
use crate::session::{RequestOptions, Session};

/// Largest page the API serves.
pub const MAX_LIMIT_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    pub page: u64,
    /// Page size the server applied.
    pub limit: u64,
}

/// One page of `results`.
#[derive(Debug, Clone)]
pub struct PaginatedList {
    meta: PageMeta,
    results: Vec<Parsed>,
}

/// One page of trashcan entries.
#[derive(Debug, Clone)]
pub struct TrashPaginatedList {
    meta: PageMeta,
    trash: Vec<Parsed>,
}

impl PaginatedList {
    pub fn meta(&self) -> PageMeta {
        self.meta
    }

    pub fn page(&self) -> u64 {
        self.meta.page
    }

    pub fn limit_per_page(&self) -> u64 {
        self.meta.limit
    }

    pub fn results(&self) -> &[Parsed] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<Parsed> {
        self.results
    }
}

impl TrashPaginatedList {
    pub fn meta(&self) -> PageMeta {
        self.meta
    }

    pub fn page(&self) -> u64 {
        self.meta.page
    }

    pub fn limit_per_page(&self) -> u64 {
        self.meta.limit
    }

    pub fn trash(&self) -> &[Parsed] {
        &self.trash
    }

    pub fn len(&self) -> usize {
        self.trash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trash.is_empty()
    }

    pub fn into_trash(self) -> Vec<Parsed> {
        self.trash
    }
}

fn parse_page(
    mut data: Map<String, Value>,
    child_key: &str,
    session: &Arc<Session>,
) -> Result<(PageMeta, Vec<Parsed>)> {
    let meta = data
        .remove("meta")
        .ok_or_else(|| DriveError::Validation("page is missing 'meta'".to_string()))?;
    let meta: PageMeta = serde_json::from_value(meta)
        .map_err(|e| DriveError::Validation(format!("invalid page meta: {e}")))?;

    let children = match data.remove(child_key) {
        Some(items @ Value::Array(_)) => Parser::new(session).parse(Some(items))?.into_list()?,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            return Err(DriveError::Validation(format!(
                "expected '{child_key}' to be an array, got {other}"
            )));
        }
    };

    Ok((meta, children))
}

impl Model for PaginatedList {
    fn parse(data: Map<String, Value>, session: &Arc<Session>) -> Result<Self> {
        let (meta, results) = parse_page(data, "results", session)?;
        Ok(Self { meta, results })
    }
}

impl Model for TrashPaginatedList {
    fn parse(data: Map<String, Value>, session: &Arc<Session>) -> Result<Self> {
        let (meta, trash) = parse_page(data, "trash", session)?;
        Ok(Self { meta, trash })
    }
}

/// Lazily walks a paginated endpoint, one page request at a time.
///
/// A next page is requested only after a full page. The sequence ends on a
/// short or empty page, or once `limit` items have been yielded.
pub struct PaginatedListGenerator {
    session: Arc<Session>,
    route: Route,
    limit: Option<usize>,
    params: BTreeMap<String, String>,
    buffer: VecDeque<Parsed>,
    yielded: usize,
    exhausted: bool,
}

impl PaginatedListGenerator {
    /// `limit` caps the total number of items; `None` walks every page.
    pub fn new(
        session: Arc<Session>,
        route: Route,
        limit: Option<usize>,
        params: BTreeMap<String, String>,
    ) -> Self {
        let per_page = limit.map_or(MAX_LIMIT_PER_PAGE, |limit| limit.min(MAX_LIMIT_PER_PAGE));
        let mut params = params;
        params.insert("limit".to_string(), per_page.to_string());

        Self {
            session,
            route,
            limit,
            params,
            buffer: VecDeque::new(),
            yielded: 0,
            exhausted: false,
        }
    }

    pub fn yielded(&self) -> usize {
        self.yielded
    }

    pub async fn next(&mut self) -> Result<Option<Parsed>> {
        if self.limit.is_some_and(|limit| self.yielded >= limit) {
            return Ok(None);
        }
        if self.buffer.is_empty() {
            if self.exhausted {
                return Ok(None);
            }
            self.next_batch().await?;
        }

        let item = self.buffer.pop_front();
        if item.is_some() {
            self.yielded += 1;
        }
        Ok(item)
    }

    async fn next_batch(&mut self) -> Result<()> {
        let options = RequestOptions::new().params(self.params.clone());
        let (meta, items) = match self.session.request(&self.route, &options).await? {
            Parsed::PaginatedList(page) => (page.meta, page.results),
            Parsed::TrashPaginatedList(page) => (page.meta, page.trash),
            other => {
                return Err(DriveError::UnexpectedModel {
                    expected: "PaginatedList",
                    found: other.kind(),
                });
            }
        };

        debug!(route = %self.route, page = meta.page, items = items.len(), "Fetched page");

        if !items.is_empty() && items.len() as u64 == meta.limit {
            self.params
                .insert("page".to_string(), (meta.page + 1).to_string());
        } else {
            self.exhausted = true;
        }
        self.buffer.extend(items);
        Ok(())
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Parsed>> + Send {
        stream::try_unfold(self, |mut generator| async move {
            Ok(generator.next().await?.map(|item| (item, generator)))
        })
    }

    /// Drain the generator.
    pub async fn all(mut self) -> Result<Vec<Parsed>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }
}
