/// Domain models for projects, branches, posts and interactions
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Kind of engagement a user can leave on a post or branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionType {
    Like,
    Share,
    Bookmark,
    Report,
    Hide,
}

impl InteractionType {
    /// Contribution of one interaction to popularity
    pub fn weight(&self) -> i64 {
        match self {
            Self::Like | Self::Share | Self::Bookmark => 1,
            Self::Report | Self::Hide => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Share => "SHARE",
            Self::Bookmark => "BOOKMARK",
            Self::Report => "REPORT",
            Self::Hide => "HIDE",
        }
    }
}

impl FromStr for InteractionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LIKE" => Ok(Self::Like),
            "SHARE" => Ok(Self::Share),
            "BOOKMARK" => Ok(Self::Bookmark),
            "REPORT" => Ok(Self::Report),
            "HIDE" => Ok(Self::Hide),
            other => Err(AppError::BadRequest(format!(
                "Invalid interaction type: {}. Must be one of: LIKE, SHARE, BOOKMARK, REPORT, HIDE",
                other
            ))),
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an interaction points at. Exactly one target per interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum InteractionTarget {
    Post(Uuid),
    Branch(Uuid),
}

impl InteractionTarget {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Post(id) | Self::Branch(id) => *id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post(_) => "post",
            Self::Branch(_) => "branch",
        }
    }
}

impl std::fmt::Display for InteractionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_str(), self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub interaction_type: InteractionType,
    pub user_id: Uuid,
    pub target: InteractionTarget,
    pub created_at: DateTime<Utc>,
}

/// Access policy attached to every project and branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub private: bool,
    #[serde(default)]
    pub allowed_users: Vec<Uuid>,
    pub allow_collaborate: bool,
    pub allow_branch: bool,
    pub allow_share: bool,
}

impl Default for Permission {
    fn default() -> Self {
        Self {
            private: false,
            allowed_users: Vec::new(),
            allow_collaborate: true,
            allow_branch: true,
            allow_share: true,
        }
    }
}

impl Permission {
    /// Public, or the viewer is the author, or the viewer is explicitly allowed.
    /// Anonymous viewers only pass the public check.
    pub fn is_visible_to(&self, author_id: Uuid, viewer: Option<Uuid>) -> bool {
        if !self.private {
            return true;
        }

        match viewer {
            Some(viewer) => viewer == author_id || self.allowed_users.contains(&viewer),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub activity: i64,
    pub popularity: i64,
    pub trending_activity: bool,
    pub trending_popularity: bool,
    pub permissions: Permission,
}

impl Project {
    pub fn is_trending(&self) -> bool {
        self.trending_activity || self.trending_popularity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_branch_id: Option<Uuid>,
    pub author_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub activity: i64,
    pub popularity: i64,
    pub trending_activity: bool,
    pub trending_popularity: bool,
    pub permissions: Permission,
}

impl Branch {
    pub fn is_trending(&self) -> bool {
        self.trending_activity || self.trending_popularity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Ordered storage keys of attached media
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

/// Public profile fields shown next to timeline entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub nickname: Option<String>,
    pub email: String,
    pub avatar: Option<String>,
    pub role: String,
    /// Ids of users following this user
    #[serde(default)]
    pub followed_by: Vec<Uuid>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            nickname: self.nickname.clone(),
            avatar: self.avatar.clone(),
        }
    }
}
