//! Account details and storage usage of the signed-in user.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::casing::snake_case_keys;
use crate::error::{DriveError, Result};
use crate::models::user::DriveUser;
use crate::models::values::Usage;
use crate::routing::{endpoints, Route};
use crate::session::{RequestOptions, Session};

/// The account behind the access key.
#[derive(Debug, Clone)]
pub struct User {
    session: Arc<Session>,
}

impl User {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn me(&self) -> Result<DriveUser> {
        let route = Route::plain(Method::GET, endpoints::USER);
        self.session
            .request(&route, &RequestOptions::new())
            .await?
            .into_drive_user()
    }

    pub async fn usage(&self) -> Result<Usage> {
        let route = Route::plain(Method::GET, endpoints::USER_USAGE);
        let data = self
            .session
            .request_raw(&route, &RequestOptions::new())
            .await?
            .map(snake_case_keys)
            .unwrap_or(Value::Null);

        serde_json::from_value(data).map_err(|e| DriveError::Validation(format!("Usage: {e}")))
    }
}
