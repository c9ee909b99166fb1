/// Interaction Service
///
/// Adds and removes LIKE/SHARE/BOOKMARK/REPORT/HIDE interactions while
/// keeping at most one per (user, target, type).
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::timeline::TimelineService;
use crate::db::InteractionStore;
use crate::domain::{Interaction, InteractionTarget, InteractionType};
use crate::error::{AppError, Result};
use crate::metrics::interactions as interaction_metrics;

pub struct InteractionService {
    store: Arc<dyn InteractionStore>,
    timeline: Arc<TimelineService>,
}

impl InteractionService {
    pub fn new(store: Arc<dyn InteractionStore>, timeline: Arc<TimelineService>) -> Self {
        Self { store, timeline }
    }

    pub async fn add_interaction(
        &self,
        user_id: Uuid,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<Interaction> {
        self.ensure_target_exists(target).await?;

        let interaction = Interaction {
            id: Uuid::new_v4(),
            interaction_type,
            user_id,
            target,
            created_at: Utc::now(),
        };

        if !self.store.insert_interaction(&interaction).await? {
            return Err(AppError::InvalidInteraction(format!(
                "{} already exists for user {} on {}",
                interaction_type, user_id, target
            )));
        }

        interaction_metrics::record_change("add", interaction_type);
        self.timeline.invalidate_user(user_id).await;

        info!(
            user_id = %user_id,
            target = %target,
            interaction_type = %interaction_type,
            "Interaction added"
        );

        Ok(interaction)
    }

    pub async fn remove_interaction(
        &self,
        user_id: Uuid,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<()> {
        self.ensure_target_exists(target).await?;

        if !self
            .store
            .delete_interaction(user_id, target, interaction_type)
            .await?
        {
            return Err(AppError::InvalidInteraction(format!(
                "no {} from user {} on {}",
                interaction_type, user_id, target
            )));
        }

        interaction_metrics::record_change("remove", interaction_type);
        self.timeline.invalidate_user(user_id).await;

        info!(
            user_id = %user_id,
            target = %target,
            interaction_type = %interaction_type,
            "Interaction removed"
        );

        Ok(())
    }

    pub async fn count(
        &self,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<i64> {
        self.ensure_target_exists(target).await?;
        self.store.count_interactions(target, interaction_type).await
    }

    async fn ensure_target_exists(&self, target: InteractionTarget) -> Result<()> {
        if self.store.target_exists(target).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("{} not found", target)))
        }
    }
}
