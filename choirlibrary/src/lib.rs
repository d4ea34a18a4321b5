//! # choirlibrary - Media library of the choir portal
//!
//! Content is organised in five categories (music, scores, videos, images,
//! documents). Each category is a table of [`ContentRecord`] rows plus a
//! storage bucket holding the uploaded files. An item is either a file
//! uploaded to the bucket or a link to external content.
//!
//! - [`MediaLibrary`]: per-category controller (refresh, create, remove,
//!   filter) keeping a local newest-first list in sync with the backend
//! - [`UploadRequest`]: validation of new items and object path generation
//! - [`RecordRepository`] / [`ObjectStore`]: persistence seams, implemented
//!   over `choirbackend` by [`BackendStore`]
//! - [`OrphanLedger`]: storage objects left behind by failed removals
//!
//! ```no_run
//! use choirbackend::BackendClient;
//! use choirlibrary::{Category, MediaLibrary, NewContent};
//!
//! # async fn demo(client: BackendClient) -> choirlibrary::Result<()> {
//! let library = MediaLibrary::with_backend(Category::Videos, client);
//! library.refresh().await?;
//! library
//!     .create(
//!         NewContent::link("Concert Clip", "https://youtube.com/watch?v=xyz"),
//!         "user-id",
//!     )
//!     .await?;
//! for record in library.filter("concert") {
//!     println!("{} -> {}", record.title, record.file_url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod error;
pub mod models;
pub mod notify;
pub mod orphans;
pub mod repository;
pub mod upload;

#[cfg(feature = "choirconfig")]
pub mod config_ext;

pub use controller::{apply_change, LibraryChange, MediaLibrary};
pub use error::{LibraryError, Result};
pub use models::{Category, ContentKind, ContentRecord, ContentSource, NewContent, RecordDraft};
pub use notify::{Notification, NotificationLevel};
pub use orphans::{OrphanEntry, OrphanLedger};
pub use repository::{BackendError, BackendResult, BackendStore, ObjectStore, RecordRepository};
pub use upload::{title_from_file_name, UploadPlan, UploadRequest};

#[cfg(feature = "choirconfig")]
pub use config_ext::LibraryConfigExt;
