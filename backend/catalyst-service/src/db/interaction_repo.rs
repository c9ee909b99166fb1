/// Interaction Repository
///
/// Uniqueness of (user, target, type) is enforced by partial unique indexes;
/// inserts use ON CONFLICT DO NOTHING and report whether a row was written.
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::InteractionStore;
use crate::domain::{Interaction, InteractionTarget, InteractionType};
use crate::error::{AppError, Result};

pub struct PgInteractionRepository {
    pool: PgPool,
}

impl PgInteractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn target_column(target: InteractionTarget) -> &'static str {
    match target {
        InteractionTarget::Post(_) => "post_id",
        InteractionTarget::Branch(_) => "branch_id",
    }
}

fn split_target(target: InteractionTarget) -> (Option<Uuid>, Option<Uuid>) {
    match target {
        InteractionTarget::Post(id) => (Some(id), None),
        InteractionTarget::Branch(id) => (None, Some(id)),
    }
}

#[async_trait]
impl InteractionStore for PgInteractionRepository {
    async fn target_exists(&self, target: InteractionTarget) -> Result<bool> {
        let sql = match target {
            InteractionTarget::Post(_) => "SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)",
            InteractionTarget::Branch(_) => "SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)",
        };

        let exists = sqlx::query_scalar::<_, bool>(sql)
            .bind(target.id())
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<bool> {
        let (post_id, branch_id) = split_target(interaction.target);

        let result = sqlx::query(
            r#"
            INSERT INTO interactions (id, interaction_type, user_id, post_id, branch_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(interaction.id)
        .bind(interaction.interaction_type.as_str())
        .bind(interaction.user_id)
        .bind(post_id)
        .bind(branch_id)
        .bind(interaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to insert {} for user {} on {}: {}",
                interaction.interaction_type, interaction.user_id, interaction.target, e
            );
            AppError::Database(e.to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_interaction(
        &self,
        user_id: Uuid,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<bool> {
        let sql = format!(
            "DELETE FROM interactions WHERE user_id = $1 AND {} = $2 AND interaction_type = $3",
            target_column(target)
        );

        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(target.id())
            .bind(interaction_type.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete interaction: {}", e);
                AppError::Database(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_interactions(
        &self,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM interactions WHERE {} = $1 AND interaction_type = $2",
            target_column(target)
        );

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(target.id())
            .bind(interaction_type.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
