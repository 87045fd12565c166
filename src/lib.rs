//! tekdrive - a client for the Drive cloud storage API.
//!
//! Responses are resolved into typed objects by their shape. Objects start as
//! stubs holding only an id and fetch their attributes the first time one is
//! read. All requests share one session that applies retries and the
//! server's rate limit.
//!
//! # Example
//!
//! ```no_run
//! use tekdrive::models::SearchQuery;
//! use tekdrive::DriveClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DriveClient::new("my-access-key")?;
//!
//!     let file = client.file("0b7b3bd6-8e1c-4b4e-a8d1-7b3c0d2a1e9f");
//!     println!("{} is {} bytes", file.name().await?, file.bytes().await?);
//!
//!     let mut results = client.search().query(&SearchQuery::new().name("report"))?;
//!     while let Some(item) = results.next().await? {
//!         println!("{:?}", item);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod casing;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod routing;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use auth::{AccessKeyAuthorizer, Authorizer};
pub use client::DriveClient;
pub use config::ClientConfig;
pub use error::{DriveError, Result};
pub use models::{DriveUser, File, Folder, Member, MembersList, Node, Parsed, Trash};
pub use routing::Route;
pub use session::{RequestOptions, Session};
