/// Branch Service
///
/// Creates branches and moves them within their project's tree. Structural
/// checks run against the project's [`BranchForest`](crate::domain::BranchForest)
/// before anything is written.
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::timeline::TimelineService;
use crate::db::BranchStore;
use crate::domain::{Branch, Permission};
use crate::error::{AppError, Result};

/// Fields a client supplies when creating a branch
#[derive(Debug, Clone, Deserialize)]
pub struct NewBranch {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_branch_id: Option<Uuid>,
    #[serde(default)]
    pub permissions: Permission,
}

pub struct BranchService {
    store: Arc<dyn BranchStore>,
    timeline: Arc<TimelineService>,
}

impl BranchService {
    pub fn new(store: Arc<dyn BranchStore>, timeline: Arc<TimelineService>) -> Self {
        Self { store, timeline }
    }

    pub async fn create_branch(
        &self,
        project_id: Uuid,
        author_id: Uuid,
        new_branch: NewBranch,
    ) -> Result<Branch> {
        let name = new_branch.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("branch name must not be empty".to_string()));
        }

        let project = self
            .store
            .find_project(project_id)
            .await?
            .filter(|p| p.permissions.is_visible_to(p.author_id, Some(author_id)))
            .ok_or_else(|| AppError::NotFound(format!("project {} not found", project_id)))?;

        if project.author_id != author_id && !project.permissions.allow_branch {
            return Err(AppError::Forbidden(format!(
                "project {} does not accept new branches",
                project_id
            )));
        }

        if let Some(parent_id) = new_branch.parent_branch_id {
            let forest = self.store.load_forest(project_id).await?;
            forest.validate_parent(project_id, None, parent_id)?;
        }

        let now = Utc::now();
        let branch = Branch {
            id: Uuid::new_v4(),
            project_id,
            parent_branch_id: new_branch.parent_branch_id,
            author_id,
            name: name.to_string(),
            description: new_branch.description,
            created_at: now,
            updated_at: None,
            activity: 0,
            popularity: 0,
            trending_activity: false,
            trending_popularity: false,
            permissions: new_branch.permissions,
        };

        self.store.insert_branch(&branch).await?;
        self.timeline.invalidate_user(author_id).await;

        info!(
            branch_id = %branch.id,
            project_id = %project_id,
            parent_branch_id = ?branch.parent_branch_id,
            "Branch created"
        );

        Ok(branch)
    }

    /// Move a branch under `new_parent`, or to the project root with `None`.
    /// Only the branch author may move it.
    pub async fn reparent_branch(
        &self,
        branch_id: Uuid,
        actor_id: Uuid,
        new_parent: Option<Uuid>,
    ) -> Result<Branch> {
        let project_id = self
            .store
            .project_of_branch(branch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("branch {} not found", branch_id)))?;

        let author_id = self
            .store
            .load_forest(project_id)
            .await?
            .get(branch_id)
            .map(|b| b.author_id)
            .ok_or_else(|| AppError::NotFound(format!("branch {} not found", branch_id)))?;

        if author_id != actor_id {
            return Err(AppError::Forbidden(
                "only the branch author can move it".to_string(),
            ));
        }

        let moved = self
            .store
            .move_branch(project_id, branch_id, new_parent)
            .await?;
        self.timeline.invalidate_user(author_id).await;

        info!(
            branch_id = %branch_id,
            parent_branch_id = ?new_parent,
            "Branch moved"
        );

        Ok(moved)
    }
}
