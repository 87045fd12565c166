//! Listing and emptying the trash.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use crate::error::Result;
use crate::models::paginator::PaginatedListGenerator;
use crate::routing::{endpoints, Route};
use crate::session::{RequestOptions, Session};

/// Items the user has trashed.
#[derive(Debug, Clone)]
pub struct Trashcan {
    session: Arc<Session>,
}

impl Trashcan {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Walk the trashcan, yielding [`Parsed::Trash`](crate::models::Parsed::Trash)
    /// entries. `order_by` is a wire field name such as `createdAt`.
    pub fn get(&self, order_by: Option<&str>, limit: Option<usize>) -> PaginatedListGenerator {
        let mut params = BTreeMap::new();
        if let Some(order_by) = order_by {
            params.insert("orderBy".to_string(), order_by.to_string());
        }
        PaginatedListGenerator::new(
            Arc::clone(&self.session),
            Route::plain(Method::GET, endpoints::TRASH),
            limit,
            params,
        )
    }

    /// Permanently delete everything in the trashcan.
    pub async fn empty(&self) -> Result<()> {
        let route = Route::plain(Method::DELETE, endpoints::TRASH);
        self.session.request_raw(&route, &RequestOptions::new()).await?;
        debug!("Emptied trashcan");
        Ok(())
    }
}
