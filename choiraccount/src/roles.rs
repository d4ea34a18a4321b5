//! Role of the signed-in user
//!
//! Roles live in the `user_roles` table, one row per user. Users without a
//! row, and any lookup failure, count as members.

use choirbackend::BackendClient;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

const ROLES_TABLE: &str = "user_roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRole {
    Admin,
    #[default]
    Member,
}

impl AppRole {
    /// Parses a role column value; anything unknown is a member
    pub fn from_column(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("admin") {
            AppRole::Admin
        } else {
            AppRole::Member
        }
    }

    pub fn is_admin(self) -> bool {
        self == AppRole::Admin
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppRole::Admin => f.write_str("admin"),
            AppRole::Member => f.write_str("member"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: Option<String>,
}

pub struct RoleService {
    client: BackendClient,
}

impl RoleService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Role of `user_id`; never fails
    pub async fn current_role(&self, user_id: &str) -> AppRole {
        let rows: Vec<RoleRow> = match self
            .client
            .table(ROLES_TABLE)
            .select_eq("user_id", user_id)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Error fetching role of {}: {}", user_id, e);
                return AppRole::Member;
            }
        };

        let role = rows
            .into_iter()
            .find_map(|row| row.role)
            .map(|value| AppRole::from_column(&value))
            .unwrap_or_default();
        debug!("User {} has role {}", user_id, role);
        role
    }

    pub async fn is_admin(&self, user_id: &str) -> bool {
        self.current_role(user_id).await.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_column() {
        assert_eq!(AppRole::from_column("admin"), AppRole::Admin);
        assert_eq!(AppRole::from_column(" Admin "), AppRole::Admin);
        assert_eq!(AppRole::from_column("member"), AppRole::Member);
        assert_eq!(AppRole::from_column("conductor"), AppRole::Member);
        assert_eq!(AppRole::default(), AppRole::Member);
    }
}
