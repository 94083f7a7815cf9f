//! Social notification types

use serde::{Deserialize, Serialize};

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone liked the owner's post
    Like,
    /// Someone commented on the owner's post
    Comment,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Like => write!(f, "like"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = NotificationKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "comment" => Ok(Self::Comment),
            _ => Err(NotificationKindParseError(s.to_string())),
        }
    }
}

/// Error parsing a notification kind string
#[derive(Debug, Clone)]
pub struct NotificationKindParseError(pub String);

impl std::fmt::Display for NotificationKindParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid notification kind: {}", self.0)
    }
}

impl std::error::Error for NotificationKindParseError {}
