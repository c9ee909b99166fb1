//! Persistence ports and their PostgreSQL implementations.
//!
//! Services only see the traits below; `main` wires the `Pg*` repositories
//! and tests substitute in-memory fakes or mocks.

pub mod branch_repo;
pub mod interaction_repo;
pub mod rows;
pub mod timeline_repo;
pub mod trending_repo;

pub use branch_repo::PgBranchRepository;
pub use interaction_repo::PgInteractionRepository;
pub use timeline_repo::PgTimelineRepository;
pub use trending_repo::PgTrendingRepository;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{Branch, BranchForest, Interaction, InteractionTarget, InteractionType, Project};
use crate::error::{AppError, Result};
use crate::services::timeline::SourceUser;
use crate::services::trending::{
    EntityKind, EntityScore, ScoringSnapshot, TrendDimension, TrendingEntry,
};

#[async_trait]
pub trait TrendStore: Send + Sync {
    /// Every project, branch, post and in-scope interaction, read consistently
    async fn load_snapshot(&self) -> Result<ScoringSnapshot>;

    async fn write_branch_score(&self, score: &EntityScore) -> Result<()>;

    async fn write_project_score(&self, score: &EntityScore) -> Result<()>;

    /// Flagged entities visible to `viewer`, highest score first
    async fn list_trending(
        &self,
        kind: EntityKind,
        dimension: TrendDimension,
        viewer: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<TrendingEntry>>;
}

#[async_trait]
pub trait TimelineStore: Send + Sync {
    /// `None` when the user does not exist
    async fn load_source(&self, user_id: Uuid) -> Result<Option<SourceUser>>;

    /// Users the viewer follows
    async fn followed_user_ids(&self, viewer: Uuid) -> Result<Vec<Uuid>>;

    async fn all_user_ids(&self, limit: i64) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn target_exists(&self, target: InteractionTarget) -> Result<bool>;

    /// Returns false when the (user, target, type) triple already exists
    async fn insert_interaction(&self, interaction: &Interaction) -> Result<bool>;

    /// Returns false when there was nothing to delete
    async fn delete_interaction(
        &self,
        user_id: Uuid,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<bool>;

    async fn count_interactions(
        &self,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<i64>;
}

#[async_trait]
pub trait BranchStore: Send + Sync {
    async fn find_project(&self, project_id: Uuid) -> Result<Option<Project>>;

    /// All branches of one project
    async fn load_forest(&self, project_id: Uuid) -> Result<BranchForest>;

    /// Project id of an existing branch
    async fn project_of_branch(&self, branch_id: Uuid) -> Result<Option<Uuid>>;

    async fn insert_branch(&self, branch: &Branch) -> Result<()>;

    /// Re-validate the move against the project's tree and store it in one
    /// atomic step. Concurrent moves inside a project are serialized, so two
    /// moves that are each valid alone can never combine into a cycle.
    async fn move_branch(
        &self,
        project_id: Uuid,
        branch_id: Uuid,
        parent_branch_id: Option<Uuid>,
    ) -> Result<Branch>;
}

/// Build the shared connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| AppError::Database(format!("failed to connect: {}", e)))
}

/// Apply embedded migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Database(format!("migration failed: {}", e)))
}
