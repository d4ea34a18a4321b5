//! # choirbackend - Client for the ChoirPortal backend-as-a-service
//!
//! The portal keeps no state of its own: accounts, content rows and media
//! files all live in a hosted backend exposing a REST record store, object
//! storage buckets and an auth service. This crate is the typed HTTP client
//! for those three services.
//!
//! ## Architecture
//!
//! - [`BackendClient`]: shared HTTP client (API key, session token, timeout)
//! - [`Table`]: rows of one table (list, select, insert, update, delete)
//! - [`Bucket`]: objects of one bucket (upload, public URL, remove)
//! - [`Auth`]: the signed-in user and its metadata
//! - [`BackendConfigExt`]: backend settings in `choirconfig`
//!
//! ## Example
//!
//! ```no_run
//! use choirbackend::{BackendClient, Order};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BackendClient::builder()
//!         .base_url("https://project.example.co")
//!         .anon_key("public-anon-key")
//!         .build()?;
//!
//!     let rows: Vec<Value> = client
//!         .table("music")
//!         .list_ordered("created_at", Order::Descending)
//!         .await?;
//!     println!("{} recordings", rows.len());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod records;
pub mod storage;

#[cfg(feature = "choirconfig")]
pub mod config_ext;

pub use auth::Auth;
pub use client::{BackendClient, ClientBuilder};
pub use error::{Error, Result};
pub use models::{AuthUser, RemovedObject, UploadedObject};
pub use records::{Order, Table};
pub use storage::Bucket;

#[cfg(feature = "choirconfig")]
pub use config_ext::BackendConfigExt;
