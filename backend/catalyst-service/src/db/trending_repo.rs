/// Trending Repository
///
/// Reads the scoring snapshot and writes scores back for branches and projects
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::{debug, error};
use uuid::Uuid;

use super::rows::{
    interactions_from_rows, BranchRow, InteractionRow, PostRow, ProjectRow, BRANCH_COLUMNS,
    INTERACTION_COLUMNS, POST_COLUMNS, PROJECT_COLUMNS,
};
use super::TrendStore;
use crate::domain::{BranchForest, InteractionTarget, Permission, Post};
use crate::error::{AppError, Result};
use crate::services::trending::{
    EntityKind, EntityScore, ScoringSnapshot, TrendDimension, TrendingEntry,
};

#[derive(Debug, FromRow)]
struct TrendingRow {
    id: Uuid,
    name: String,
    author_id: Uuid,
    project_id: Option<Uuid>,
    activity: i64,
    popularity: i64,
    trending_activity: bool,
    trending_popularity: bool,
    is_private: bool,
    allowed_users: Vec<Uuid>,
    allow_collaborate: bool,
    allow_branch: bool,
    allow_share: bool,
}

pub struct PgTrendingRepository {
    pool: PgPool,
}

impl PgTrendingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_score(&self, table: &str, score: &EntityScore) -> Result<()> {
        let sql = format!(
            r#"
            UPDATE {}
            SET activity = $2,
                popularity = $3,
                trending_activity = $4,
                trending_popularity = $5
            WHERE id = $1
            "#,
            table
        );

        let result = sqlx::query(&sql)
            .bind(score.id)
            .bind(score.activity)
            .bind(score.popularity)
            .bind(score.trending_activity)
            .bind(score.trending_popularity)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to write {} score for {}: {}", score.kind, score.id, e);
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {}", score.kind, score.id)));
        }

        Ok(())
    }
}

#[async_trait]
impl TrendStore for PgTrendingRepository {
    async fn load_snapshot(&self) -> Result<ScoringSnapshot> {
        let mut tx = self.pool.begin().await?;

        // One snapshot for all four reads
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let project_sql = format!("SELECT {} FROM projects", PROJECT_COLUMNS);
        let projects: Vec<ProjectRow> = sqlx::query_as(&project_sql)
            .fetch_all(&mut *tx)
            .await?;

        let branch_sql = format!("SELECT {} FROM branches", BRANCH_COLUMNS);
        let branches: Vec<BranchRow> = sqlx::query_as(&branch_sql)
            .fetch_all(&mut *tx)
            .await?;

        let post_sql = format!("SELECT {} FROM posts", POST_COLUMNS);
        let posts: Vec<PostRow> = sqlx::query_as(&post_sql).fetch_all(&mut *tx).await?;

        let interaction_sql = format!("SELECT {} FROM interactions", INTERACTION_COLUMNS);
        let interactions: Vec<InteractionRow> = sqlx::query_as(&interaction_sql)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut post_interactions: HashMap<Uuid, Vec<_>> = HashMap::new();
        let mut branch_interactions: HashMap<Uuid, Vec<_>> = HashMap::new();
        for interaction in interactions_from_rows(interactions)? {
            match interaction.target {
                InteractionTarget::Post(id) => {
                    post_interactions.entry(id).or_default().push(interaction)
                }
                InteractionTarget::Branch(id) => {
                    branch_interactions.entry(id).or_default().push(interaction)
                }
            }
        }

        let mut posts_by_branch: HashMap<Uuid, Vec<Post>> = HashMap::new();
        for row in posts {
            let mut post = Post::from(row);
            post.interactions = post_interactions.remove(&post.id).unwrap_or_default();
            posts_by_branch.entry(post.branch_id).or_default().push(post);
        }

        let snapshot = ScoringSnapshot {
            projects: projects.into_iter().map(Into::into).collect(),
            branches: BranchForest::from_branches(branches.into_iter().map(Into::into)),
            posts: posts_by_branch,
            branch_interactions,
        };

        debug!(
            projects = snapshot.projects.len(),
            branches = snapshot.branches.len(),
            "Loaded scoring snapshot"
        );

        Ok(snapshot)
    }

    async fn write_branch_score(&self, score: &EntityScore) -> Result<()> {
        self.write_score("branches", score).await
    }

    async fn write_project_score(&self, score: &EntityScore) -> Result<()> {
        self.write_score("projects", score).await
    }

    async fn list_trending(
        &self,
        kind: EntityKind,
        dimension: TrendDimension,
        viewer: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<TrendingEntry>> {
        let (table, project_column) = match kind {
            EntityKind::Branch => ("branches", "project_id"),
            EntityKind::Project => ("projects", "NULL::uuid AS project_id"),
        };
        let (flag_column, score_column) = match dimension {
            TrendDimension::Activity => ("trending_activity", "activity"),
            TrendDimension::Popularity => ("trending_popularity", "popularity"),
        };

        let sql = format!(
            r#"
            SELECT id, name, author_id, {project_column}, activity, popularity,
                   trending_activity, trending_popularity,
                   is_private, allowed_users, allow_collaborate, allow_branch, allow_share
            FROM {table}
            WHERE {flag_column} = TRUE
              AND (is_private = FALSE OR author_id = $1 OR $1 = ANY(allowed_users))
            ORDER BY {score_column} DESC, id
            LIMIT $2
            "#
        );

        let rows: Vec<TrendingRow> = sqlx::query_as(&sql)
            .bind(viewer)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to list trending {}: {}", table, e);
                AppError::Database(e.to_string())
            })?;

        Ok(rows
            .into_iter()
            .map(|row| TrendingEntry {
                kind,
                id: row.id,
                name: row.name,
                author_id: row.author_id,
                project_id: row.project_id,
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
            })
            .collect())
    }
}
