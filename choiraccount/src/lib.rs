//! # choiraccount - Member account helpers
//!
//! - [`RoleService`]: admin or member, from the `user_roles` table
//! - [`ProfileService`]: display name and avatar of the signed-in user
//! - [`display_name`] / [`display_initial`]: greeting and avatar placeholder

pub mod error;
pub mod profile;
pub mod roles;

pub use error::{AccountError, Result};
pub use profile::{display_initial, display_name, Profile, ProfileService};
pub use roles::{AppRole, RoleService};
