//! In-memory store and fixtures shared by the integration tests.
//!
//! `InMemoryStore` implements every persistence port, so the real services
//! run end to end without PostgreSQL.
#![allow(dead_code)]

use async_trait::async_trait;
use catalyst_cache::{EvictionKind, JsonCache, MemoryCache, MemoryCacheConfig};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use catalyst_service::db::{BranchStore, InteractionStore, TimelineStore, TrendStore};
use catalyst_service::domain::{
    Branch, BranchForest, Interaction, InteractionTarget, InteractionType, Permission, Post,
    Project, UserSummary,
};
use catalyst_service::error::{AppError, Result};
use catalyst_service::handlers::AppState;
use catalyst_service::services::timeline::SourceUser;
use catalyst_service::services::trending::{
    EntityKind, EntityScore, ScoringSnapshot, TrendDimension, TrendingEntry,
};
use catalyst_service::services::{
    BranchService, InteractionService, TimelineService, TrendingService,
};

pub const PAGE_SIZE: usize = 5;
pub const WINDOW_DAYS: i64 = 7;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserSummary>,
    /// (follower, followee)
    follows: Vec<(Uuid, Uuid)>,
    projects: HashMap<Uuid, Project>,
    branches: HashMap<Uuid, Branch>,
    posts: HashMap<Uuid, Post>,
    interactions: Vec<Interaction>,
    failing_writes: HashSet<Uuid>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    source_loads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().users.insert(
            id,
            UserSummary {
                id,
                username: username.to_string(),
                nickname: None,
                avatar: None,
            },
        );
        id
    }

    pub fn follow(&self, follower: Uuid, followee: Uuid) {
        self.state.lock().unwrap().follows.push((follower, followee));
    }

    pub fn add_project(&self, author_id: Uuid, permissions: Permission) -> Project {
        let project = Project {
            id: Uuid::new_v4(),
            name: "Project".to_string(),
            description: String::new(),
            author_id,
            created_at: Utc::now() - Duration::days(30),
            updated_at: None,
            activity: 0,
            popularity: 0,
            trending_activity: false,
            trending_popularity: false,
            permissions,
        };
        self.state
            .lock()
            .unwrap()
            .projects
            .insert(project.id, project.clone());
        project
    }

    pub fn add_branch(
        &self,
        project_id: Uuid,
        parent_branch_id: Option<Uuid>,
        author_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Branch {
        self.add_branch_with(
            project_id,
            parent_branch_id,
            author_id,
            created_at,
            Permission::default(),
        )
    }

    pub fn add_branch_with(
        &self,
        project_id: Uuid,
        parent_branch_id: Option<Uuid>,
        author_id: Uuid,
        created_at: DateTime<Utc>,
        permissions: Permission,
    ) -> Branch {
        let branch = Branch {
            id: Uuid::new_v4(),
            project_id,
            parent_branch_id,
            author_id,
            name: "Branch".to_string(),
            description: String::new(),
            created_at,
            updated_at: None,
            activity: 0,
            popularity: 0,
            trending_activity: false,
            trending_popularity: false,
            permissions,
        };
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(branch.id, branch.clone());
        branch
    }

    pub fn add_post(&self, branch_id: Uuid, author_id: Uuid, created_at: DateTime<Utc>) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            branch_id,
            author_id,
            content: "hello".to_string(),
            created_at,
            updated_at: None,
            media: Vec::new(),
            interactions: Vec::new(),
        };
        self.state
            .lock()
            .unwrap()
            .posts
            .insert(post.id, post.clone());
        post
    }

    pub fn add_interaction(
        &self,
        user_id: Uuid,
        target: InteractionTarget,
        interaction_type: InteractionType,
        created_at: DateTime<Utc>,
    ) {
        self.state.lock().unwrap().interactions.push(Interaction {
            id: Uuid::new_v4(),
            interaction_type,
            user_id,
            target,
            created_at,
        });
    }

    /// Make every score write for `id` fail
    pub fn fail_writes_for(&self, id: Uuid) {
        self.state.lock().unwrap().failing_writes.insert(id);
    }

    pub fn branch(&self, id: Uuid) -> Option<Branch> {
        self.state.lock().unwrap().branches.get(&id).cloned()
    }

    pub fn project(&self, id: Uuid) -> Option<Project> {
        self.state.lock().unwrap().projects.get(&id).cloned()
    }

    pub fn interaction_count(&self) -> usize {
        self.state.lock().unwrap().interactions.len()
    }

    /// How many times a timeline source was read from the store
    pub fn source_loads(&self) -> usize {
        self.source_loads.load(Ordering::SeqCst)
    }

    fn write_score(&self, score: &EntityScore) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(&score.id) {
            return Err(AppError::Database("connection reset".to_string()));
        }

        match score.kind {
            EntityKind::Branch => {
                let branch = state
                    .branches
                    .get_mut(&score.id)
                    .ok_or_else(|| AppError::NotFound(format!("branch {}", score.id)))?;
                branch.activity = score.activity;
                branch.popularity = score.popularity;
                branch.trending_activity = score.trending_activity;
                branch.trending_popularity = score.trending_popularity;
            }
            EntityKind::Project => {
                let project = state
                    .projects
                    .get_mut(&score.id)
                    .ok_or_else(|| AppError::NotFound(format!("project {}", score.id)))?;
                project.activity = score.activity;
                project.popularity = score.popularity;
                project.trending_activity = score.trending_activity;
                project.trending_popularity = score.trending_popularity;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TrendStore for InMemoryStore {
    async fn load_snapshot(&self) -> Result<ScoringSnapshot> {
        let state = self.state.lock().unwrap();

        let mut posts: HashMap<Uuid, Vec<Post>> = HashMap::new();
        for post in state.posts.values() {
            let mut post = post.clone();
            post.interactions = state
                .interactions
                .iter()
                .filter(|i| i.target == InteractionTarget::Post(post.id))
                .cloned()
                .collect();
            posts.entry(post.branch_id).or_default().push(post);
        }

        let mut branch_interactions: HashMap<Uuid, Vec<Interaction>> = HashMap::new();
        for interaction in &state.interactions {
            if let InteractionTarget::Branch(id) = interaction.target {
                branch_interactions
                    .entry(id)
                    .or_default()
                    .push(interaction.clone());
            }
        }

        Ok(ScoringSnapshot {
            projects: state.projects.values().cloned().collect(),
            branches: BranchForest::from_branches(state.branches.values().cloned()),
            posts,
            branch_interactions,
        })
    }

    async fn write_branch_score(&self, score: &EntityScore) -> Result<()> {
        self.write_score(score)
    }

    async fn write_project_score(&self, score: &EntityScore) -> Result<()> {
        self.write_score(score)
    }

    async fn list_trending(
        &self,
        kind: EntityKind,
        dimension: TrendDimension,
        viewer: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<TrendingEntry>> {
        let state = self.state.lock().unwrap();

        let mut entries: Vec<TrendingEntry> = match kind {
            EntityKind::Branch => state
                .branches
                .values()
                .map(|b| TrendingEntry {
                    kind,
                    id: b.id,
                    name: b.name.clone(),
                    author_id: b.author_id,
                    project_id: Some(b.project_id),
                    activity: b.activity,
                    popularity: b.popularity,
                    trending_activity: b.trending_activity,
                    trending_popularity: b.trending_popularity,
                    permissions: b.permissions.clone(),
                })
                .collect(),
            EntityKind::Project => state
                .projects
                .values()
                .map(|p| TrendingEntry {
                    kind,
                    id: p.id,
                    name: p.name.clone(),
                    author_id: p.author_id,
                    project_id: None,
                    activity: p.activity,
                    popularity: p.popularity,
                    trending_activity: p.trending_activity,
                    trending_popularity: p.trending_popularity,
                    permissions: p.permissions.clone(),
                })
                .collect(),
        };

        entries.retain(|e| {
            let flagged = match dimension {
                TrendDimension::Activity => e.trending_activity,
                TrendDimension::Popularity => e.trending_popularity,
            };
            flagged && e.permissions.is_visible_to(e.author_id, viewer)
        });
        entries.sort_by(|a, b| {
            let (sa, sb) = match dimension {
                TrendDimension::Activity => (a.activity, b.activity),
                TrendDimension::Popularity => (a.popularity, b.popularity),
            };
            sb.cmp(&sa).then(a.id.cmp(&b.id))
        });
        entries.truncate(limit as usize);

        Ok(entries)
    }
}

#[async_trait]
impl TimelineStore for InMemoryStore {
    async fn load_source(&self, user_id: Uuid) -> Result<Option<SourceUser>> {
        self.source_loads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();

        let Some(user) = state.users.get(&user_id).cloned() else {
            return Ok(None);
        };

        let mut source = SourceUser::new(user);
        for interaction in state.interactions.iter().filter(|i| i.user_id == user_id) {
            match interaction.target {
                InteractionTarget::Post(_) => source.post_interactions.push(interaction.clone()),
                InteractionTarget::Branch(_) => {
                    source.branch_interactions.push(interaction.clone())
                }
            }
        }
        source.projects = state
            .projects
            .values()
            .filter(|p| p.author_id == user_id)
            .cloned()
            .collect();
        source.branches = state
            .branches
            .values()
            .filter(|b| b.author_id == user_id)
            .cloned()
            .collect();
        source.posts = state
            .posts
            .values()
            .filter(|p| p.author_id == user_id)
            .cloned()
            .collect();

        Ok(Some(source))
    }

    async fn followed_user_ids(&self, viewer: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == viewer)
            .map(|(_, followee)| *followee)
            .collect())
    }

    async fn all_user_ids(&self, limit: i64) -> Result<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<Uuid> = state.users.keys().copied().collect();
        ids.sort();
        ids.truncate(limit as usize);
        Ok(ids)
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn target_exists(&self, target: InteractionTarget) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(match target {
            InteractionTarget::Post(id) => state.posts.contains_key(&id),
            InteractionTarget::Branch(id) => state.branches.contains_key(&id),
        })
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let duplicate = state.interactions.iter().any(|i| {
            i.user_id == interaction.user_id
                && i.target == interaction.target
                && i.interaction_type == interaction.interaction_type
        });
        if duplicate {
            return Ok(false);
        }
        state.interactions.push(interaction.clone());
        Ok(true)
    }

    async fn delete_interaction(
        &self,
        user_id: Uuid,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.interactions.len();
        state.interactions.retain(|i| {
            !(i.user_id == user_id && i.target == target && i.interaction_type == interaction_type)
        });
        Ok(state.interactions.len() < before)
    }

    async fn count_interactions(
        &self,
        target: InteractionTarget,
        interaction_type: InteractionType,
    ) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .interactions
            .iter()
            .filter(|i| i.target == target && i.interaction_type == interaction_type)
            .count() as i64)
    }
}

#[async_trait]
impl BranchStore for InMemoryStore {
    async fn find_project(&self, project_id: Uuid) -> Result<Option<Project>> {
        Ok(self.project(project_id))
    }

    async fn load_forest(&self, project_id: Uuid) -> Result<BranchForest> {
        let state = self.state.lock().unwrap();
        Ok(BranchForest::from_branches(
            state
                .branches
                .values()
                .filter(|b| b.project_id == project_id)
                .cloned(),
        ))
    }

    async fn project_of_branch(&self, branch_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.branch(branch_id).map(|b| b.project_id))
    }

    async fn insert_branch(&self, branch: &Branch) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(branch.id, branch.clone());
        Ok(())
    }

    async fn move_branch(
        &self,
        project_id: Uuid,
        branch_id: Uuid,
        parent_branch_id: Option<Uuid>,
    ) -> Result<Branch> {
        // One lock for check and write, like the row locks in PostgreSQL
        let mut state = self.state.lock().unwrap();
        let mut forest = BranchForest::from_branches(
            state
                .branches
                .values()
                .filter(|b| b.project_id == project_id)
                .cloned(),
        );
        forest.reparent(branch_id, parent_branch_id)?;

        let moved = forest
            .get(branch_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("branch {}", branch_id)))?;
        state.branches.insert(branch_id, moved.clone());
        Ok(moved)
    }
}

pub fn memory_cache() -> JsonCache {
    JsonCache::new(Arc::new(MemoryCache::new(&MemoryCacheConfig {
        max_capacity: 1_000,
        ttl: std::time::Duration::from_secs(60),
        eviction: EvictionKind::Lru,
    })))
}

/// All four services wired to one store
pub struct Services {
    pub trending: Arc<TrendingService>,
    pub timeline: Arc<TimelineService>,
    pub interactions: Arc<InteractionService>,
    pub branches: Arc<BranchService>,
}

impl Services {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        let trending = Arc::new(TrendingService::new(store.clone(), WINDOW_DAYS));
        let timeline = Arc::new(TimelineService::new(
            store.clone(),
            memory_cache(),
            PAGE_SIZE,
            100,
        ));
        let interactions = Arc::new(InteractionService::new(store.clone(), timeline.clone()));
        let branches = Arc::new(BranchService::new(store, timeline.clone()));

        Self {
            trending,
            timeline,
            interactions,
            branches,
        }
    }

    pub fn into_state(self) -> AppState {
        AppState {
            trending: self.trending,
            timeline: self.timeline,
            interactions: self.interactions,
            branches: self.branches,
        }
    }
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

pub fn private_to(allowed: &[Uuid]) -> Permission {
    Permission {
        private: true,
        allowed_users: allowed.to_vec(),
        ..Permission::default()
    }
}
