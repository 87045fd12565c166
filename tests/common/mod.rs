//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tekdrive::config::ClientConfig;
use tekdrive::session::Sleeper;
use tekdrive::{AccessKeyAuthorizer, DriveClient, Session};

pub const ACCESS_KEY: &str = "test-access-key";

/// Records requested sleeps instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// A session against `base_url` that records sleeps.
pub fn session(base_url: &str) -> (Arc<Session>, Arc<RecordingSleeper>) {
    let config = ClientConfig::builder()
        .base_url(base_url)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let authorizer = AccessKeyAuthorizer::new(ACCESS_KEY).unwrap();
    let sleeper = Arc::new(RecordingSleeper::default());
    let session = Session::new(Arc::new(authorizer), config)
        .unwrap()
        .with_sleeper(sleeper.clone());
    (Arc::new(session), sleeper)
}

pub fn client(base_url: &str) -> (DriveClient, Arc<RecordingSleeper>) {
    let (session, sleeper) = session(base_url);
    (DriveClient::from_session(session), sleeper)
}
