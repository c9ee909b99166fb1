/// Timeline Repository
///
/// Loads everything a single user contributes to timelines
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::error;
use uuid::Uuid;

use super::rows::{
    interactions_from_rows, BranchRow, InteractionRow, PostRow, ProjectRow, UserRow,
    BRANCH_COLUMNS, INTERACTION_COLUMNS, POST_COLUMNS, PROJECT_COLUMNS,
};
use super::TimelineStore;
use crate::domain::{InteractionTarget, Post, User};
use crate::error::{AppError, Result};
use crate::services::timeline::SourceUser;

pub struct PgTimelineRepository {
    pool: PgPool,
}

impl PgTimelineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.nickname, u.email, u.avatar, u.role,
                   ARRAY(SELECT f.follower_id FROM follows f WHERE f.followee_id = u.id)
                       AS followed_by
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", user_id, e);
            AppError::Database(e.to_string())
        })?;

        Ok(row.map(User::from))
    }

    /// Media keys for a set of posts, in display order
    async fn media_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT post_id, storage_key
            FROM post_media
            WHERE post_id = ANY($1)
            ORDER BY post_id, position
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut media: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (post_id, key) in rows {
            media.entry(post_id).or_default().push(key);
        }
        Ok(media)
    }
}

#[async_trait]
impl TimelineStore for PgTimelineRepository {
    async fn load_source(&self, user_id: Uuid) -> Result<Option<SourceUser>> {
        let Some(user) = self.find_user(user_id).await? else {
            return Ok(None);
        };

        let interaction_sql = format!(
            "SELECT {} FROM interactions WHERE user_id = $1 ORDER BY created_at DESC",
            INTERACTION_COLUMNS
        );
        let interaction_rows: Vec<InteractionRow> = sqlx::query_as(&interaction_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        let (post_interactions, branch_interactions): (Vec<_>, Vec<_>) =
            interactions_from_rows(interaction_rows)?
                .into_iter()
                .partition(|i| matches!(i.target, InteractionTarget::Post(_)));

        let project_sql = format!(
            "SELECT {} FROM projects WHERE author_id = $1",
            PROJECT_COLUMNS
        );
        let projects: Vec<ProjectRow> = sqlx::query_as(&project_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let branch_sql = format!(
            "SELECT {} FROM branches WHERE author_id = $1",
            BRANCH_COLUMNS
        );
        let branches: Vec<BranchRow> = sqlx::query_as(&branch_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let post_sql = format!("SELECT {} FROM posts WHERE author_id = $1", POST_COLUMNS);
        let post_rows: Vec<PostRow> = sqlx::query_as(&post_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let post_ids: Vec<Uuid> = post_rows.iter().map(|p| p.id).collect();
        let mut media = self.media_for_posts(&post_ids).await?;
        let posts: Vec<Post> = post_rows
            .into_iter()
            .map(|row| {
                let mut post = Post::from(row);
                post.media = media.remove(&post.id).unwrap_or_default();
                post
            })
            .collect();

        Ok(Some(SourceUser {
            user: user.summary(),
            post_interactions,
            branch_interactions,
            projects: projects.into_iter().map(Into::into).collect(),
            branches: branches.into_iter().map(Into::into).collect(),
            posts,
        }))
    }

    async fn followed_user_ids(&self, viewer: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT followee_id FROM follows WHERE follower_id = $1",
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn all_user_ids(&self, limit: i64) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
