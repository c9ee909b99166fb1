//! Row types as stored in PostgreSQL and their conversion into domain models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    Branch, Interaction, InteractionTarget, InteractionType, Permission, Post, Project, User,
};
use crate::error::AppError;

pub const PROJECT_COLUMNS: &str = "id, name, description, author_id, created_at, updated_at, \
     activity, popularity, trending_activity, trending_popularity, \
     is_private, allowed_users, allow_collaborate, allow_branch, allow_share";

pub const BRANCH_COLUMNS: &str = "id, project_id, parent_branch_id, author_id, name, description, \
     created_at, updated_at, activity, popularity, trending_activity, trending_popularity, \
     is_private, allowed_users, allow_collaborate, allow_branch, allow_share";

pub const POST_COLUMNS: &str = "id, branch_id, author_id, content, created_at, updated_at";

pub const INTERACTION_COLUMNS: &str =
    "id, interaction_type, user_id, post_id, branch_id, created_at";

#[derive(Debug, FromRow)]
pub struct ProjectRow {
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
    pub is_private: bool,
    pub allowed_users: Vec<Uuid>,
    pub allow_collaborate: bool,
    pub allow_branch: bool,
    pub allow_share: bool,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            activity: row.activity,
            popularity: row.popularity,
            trending_activity: row.trending_activity,
            trending_popularity: row.trending_popularity,
            permissions: Permission {
                private: row.is_private,
                allowed_users: row.allowed_users,
                allow_collaborate: row.allow_collaborate,
                allow_branch: row.allow_branch,
                allow_share: row.allow_share,
            },
        }
    }
}

#[derive(Debug, FromRow)]
pub struct BranchRow {
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
    pub is_private: bool,
    pub allowed_users: Vec<Uuid>,
    pub allow_collaborate: bool,
    pub allow_branch: bool,
    pub allow_share: bool,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.id,
            project_id: row.project_id,
            parent_branch_id: row.parent_branch_id,
            author_id: row.author_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            activity: row.activity,
            popularity: row.popularity,
            trending_activity: row.trending_activity,
            trending_popularity: row.trending_popularity,
            permissions: Permission {
                private: row.is_private,
                allowed_users: row.allowed_users,
                allow_collaborate: row.allow_collaborate,
                allow_branch: row.allow_branch,
                allow_share: row.allow_share,
            },
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            branch_id: row.branch_id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            media: Vec::new(),
            interactions: Vec::new(),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct InteractionRow {
    pub id: Uuid,
    pub interaction_type: String,
    pub user_id: Uuid,
    pub post_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = AppError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let target = match (row.post_id, row.branch_id) {
            (Some(post_id), None) => InteractionTarget::Post(post_id),
            (None, Some(branch_id)) => InteractionTarget::Branch(branch_id),
            _ => {
                return Err(AppError::Database(format!(
                    "interaction {} must target exactly one of post or branch",
                    row.id
                )))
            }
        };

        let interaction_type: InteractionType = row.interaction_type.parse().map_err(|_| {
            AppError::Database(format!(
                "interaction {} has unknown type '{}'",
                row.id, row.interaction_type
            ))
        })?;

        Ok(Interaction {
            id: row.id,
            interaction_type,
            user_id: row.user_id,
            target,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub nickname: Option<String>,
    pub email: String,
    pub avatar: Option<String>,
    pub role: String,
    pub followed_by: Vec<Uuid>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            nickname: row.nickname,
            email: row.email,
            avatar: row.avatar,
            role: row.role,
            followed_by: row.followed_by,
        }
    }
}

/// Convert a batch of interaction rows, failing on the first corrupt one
pub fn interactions_from_rows(rows: Vec<InteractionRow>) -> Result<Vec<Interaction>, AppError> {
    rows.into_iter().map(Interaction::try_from).collect()
}
