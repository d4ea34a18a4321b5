//! User-facing notifications emitted by the library controller

use crate::models::Category;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A short message for the user, one per completed or failed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub category: Category,
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NotificationLevel::Success => write!(f, "[{}] {}", self.category, self.message),
            NotificationLevel::Error => write!(f, "[{}] error: {}", self.category, self.message),
        }
    }
}
