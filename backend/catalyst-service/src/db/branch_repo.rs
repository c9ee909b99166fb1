/// Branch Repository
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::error;
use uuid::Uuid;

use super::rows::{BranchRow, ProjectRow, BRANCH_COLUMNS, PROJECT_COLUMNS};
use super::BranchStore;
use crate::domain::{Branch, BranchForest, Project};
use crate::error::{AppError, Result};

pub struct PgBranchRepository {
    pool: PgPool,
}

impl PgBranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BranchStore for PgBranchRepository {
    async fn find_project(&self, project_id: Uuid) -> Result<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        let row: Option<ProjectRow> = sqlx::query_as(&sql)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Project::from))
    }

    async fn load_forest(&self, project_id: Uuid) -> Result<BranchForest> {
        let sql = format!(
            "SELECT {} FROM branches WHERE project_id = $1",
            BRANCH_COLUMNS
        );
        let rows: Vec<BranchRow> = sqlx::query_as(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(BranchForest::from_branches(rows.into_iter().map(Branch::from)))
    }

    async fn project_of_branch(&self, branch_id: Uuid) -> Result<Option<Uuid>> {
        let project_id =
            sqlx::query_scalar::<_, Uuid>("SELECT project_id FROM branches WHERE id = $1")
                .bind(branch_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(project_id)
    }

    async fn insert_branch(&self, branch: &Branch) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO branches (
                id, project_id, parent_branch_id, author_id, name, description,
                created_at, updated_at,
                is_private, allowed_users, allow_collaborate, allow_branch, allow_share
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(branch.id)
        .bind(branch.project_id)
        .bind(branch.parent_branch_id)
        .bind(branch.author_id)
        .bind(&branch.name)
        .bind(&branch.description)
        .bind(branch.created_at)
        .bind(branch.updated_at)
        .bind(branch.permissions.private)
        .bind(&branch.permissions.allowed_users)
        .bind(branch.permissions.allow_collaborate)
        .bind(branch.permissions.allow_branch)
        .bind(branch.permissions.allow_share)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert branch {}: {}", branch.id, e);
            AppError::Database(e.to_string())
        })?;

        Ok(())
    }

    async fn move_branch(
        &self,
        project_id: Uuid,
        branch_id: Uuid,
        parent_branch_id: Option<Uuid>,
    ) -> Result<Branch> {
        let mut tx: Transaction<'_, Postgres> = self.pool.begin().await?;

        // Row locks on the whole project tree serialize competing moves
        let sql = format!(
            "SELECT {} FROM branches WHERE project_id = $1 FOR UPDATE",
            BRANCH_COLUMNS
        );
        let rows: Vec<BranchRow> = sqlx::query_as(&sql)
            .bind(project_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut forest = BranchForest::from_branches(rows.into_iter().map(Branch::from));
        forest.reparent(branch_id, parent_branch_id)?;

        sqlx::query("UPDATE branches SET parent_branch_id = $2 WHERE id = $1")
            .bind(branch_id)
            .bind(parent_branch_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to move branch {}: {}", branch_id, e);
                AppError::Database(e.to_string())
            })?;

        tx.commit().await?;

        forest
            .get(branch_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("branch {} not found", branch_id)))
    }
}
