//! Arena of branches keyed by id with a parent -> children index.
//!
//! Branches reference their parent by id only, so the tree never holds
//! owning back-references. All structural checks (same project, no cycles)
//! go through [`BranchForest::validate_parent`].

use std::collections::HashMap;
use uuid::Uuid;

use super::models::Branch;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Default)]
pub struct BranchForest {
    branches: HashMap<Uuid, Branch>,
    children: HashMap<Uuid, Vec<Uuid>>,
    by_project: HashMap<Uuid, Vec<Uuid>>,
}

impl BranchForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_branches(branches: impl IntoIterator<Item = Branch>) -> Self {
        let mut forest = Self::new();
        for branch in branches {
            forest.insert(branch);
        }
        forest
    }

    /// Insert or replace a branch, keeping the children index in sync
    pub fn insert(&mut self, branch: Branch) {
        let previous = self
            .branches
            .get(&branch.id)
            .map(|previous| (previous.parent_branch_id, previous.project_id));

        match previous {
            Some((old_parent, old_project)) => {
                if let Some(old_parent) = old_parent {
                    detach(&mut self.children, old_parent, branch.id);
                }
                if old_project != branch.project_id {
                    detach(&mut self.by_project, old_project, branch.id);
                    self.by_project
                        .entry(branch.project_id)
                        .or_default()
                        .push(branch.id);
                }
            }
            None => {
                self.by_project
                    .entry(branch.project_id)
                    .or_default()
                    .push(branch.id);
            }
        }

        if let Some(parent) = branch.parent_branch_id {
            self.children.entry(parent).or_default().push(branch.id);
        }
        self.branches.insert(branch.id, branch);
    }

    pub fn get(&self, id: Uuid) -> Option<&Branch> {
        self.branches.get(&id)
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    /// Direct children only
    pub fn children_of(&self, id: Uuid) -> impl Iterator<Item = &Branch> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |child| self.branches.get(child))
    }

    /// Branches of one project, in no particular order
    pub fn project_branches(&self, project_id: Uuid) -> impl Iterator<Item = &Branch> {
        self.by_project
            .get(&project_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.branches.get(id))
    }

    /// True when `candidate` sits somewhere below `ancestor`.
    ///
    /// A parent chain longer than the arena means stored data already loops;
    /// that is reported as a descendant so no further move can extend it.
    pub fn is_descendant_of(&self, candidate: Uuid, ancestor: Uuid) -> bool {
        let mut current = self.branches.get(&candidate).and_then(|b| b.parent_branch_id);
        let mut steps = 0;

        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.branches.len() {
                return true;
            }
            current = self.branches.get(&id).and_then(|b| b.parent_branch_id);
        }

        false
    }

    /// Check that `parent_id` may become the parent of `branch_id`
    /// (`None` for a branch that does not exist yet) inside `project_id`.
    pub fn validate_parent(
        &self,
        project_id: Uuid,
        branch_id: Option<Uuid>,
        parent_id: Uuid,
    ) -> Result<()> {
        let parent = self.branches.get(&parent_id).ok_or_else(|| {
            AppError::InvalidBranch(format!("parent branch {} does not exist", parent_id))
        })?;

        if parent.project_id != project_id {
            return Err(AppError::InvalidBranch(format!(
                "parent branch {} belongs to a different project",
                parent_id
            )));
        }

        if let Some(branch_id) = branch_id {
            if parent_id == branch_id || self.is_descendant_of(parent_id, branch_id) {
                return Err(AppError::InvalidBranch(format!(
                    "moving branch {} under {} would create a cycle",
                    branch_id, parent_id
                )));
            }
        }

        Ok(())
    }

    /// Move a branch under a new parent (or to the project root)
    pub fn reparent(&mut self, branch_id: Uuid, new_parent: Option<Uuid>) -> Result<()> {
        let branch = self
            .branches
            .get(&branch_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("branch {} not found", branch_id)))?;

        if let Some(parent_id) = new_parent {
            self.validate_parent(branch.project_id, Some(branch_id), parent_id)?;
        }

        self.insert(Branch {
            parent_branch_id: new_parent,
            ..branch
        });
        Ok(())
    }
}

fn detach(index: &mut HashMap<Uuid, Vec<Uuid>>, key: Uuid, id: Uuid) {
    if let Some(ids) = index.get_mut(&key) {
        ids.retain(|existing| *existing != id);
        if ids.is_empty() {
            index.remove(&key);
        }
    }
}
