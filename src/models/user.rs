use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::post::{Post, PostStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::Administrator => "administrator",
            UserRole::Editor => "editor",
            UserRole::Author => "author",
            UserRole::Contributor => "contributor",
            UserRole::Subscriber => "subscriber",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrator" => Ok(UserRole::Administrator),
            "editor" => Ok(UserRole::Editor),
            "author" => Ok(UserRole::Author),
            "contributor" => Ok(UserRole::Contributor),
            "subscriber" => Ok(UserRole::Subscriber),
            other => anyhow::bail!("Unknown role: {other}"),
        }
    }
}

impl UserRole {
    /// Site settings are administrator-only.
    pub fn can_manage_options(&self) -> bool {
        matches!(self, UserRole::Administrator)
    }

    /// Whether a user with this role (and id) may edit `post`.
    pub fn can_edit_post(&self, user_id: Uuid, post: &Post) -> bool {
        match self {
            UserRole::Administrator | UserRole::Editor => true,
            UserRole::Author => post.author_id == user_id,
            // Contributors lose edit rights once their post goes live.
            UserRole::Contributor => {
                post.author_id == user_id && post.status != PostStatus::Publish
            }
            UserRole::Subscriber => false,
        }
    }
}
