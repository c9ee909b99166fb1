//! Rolling-window activity and popularity scores with median-split
//! trending flags.
//!
//! Everything in this module is pure: it reads a [`ScoringSnapshot`] and
//! returns a [`ScoreBoard`]. Persistence lives in the service layer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{BranchForest, Interaction, Post, Project};
use crate::error::AppError;

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Lower bound of the scoring window. Records stamped exactly at the
/// bound are inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWindow {
    pub start: DateTime<Utc>,
}

impl ScoringWindow {
    pub fn ending_at(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start
    }
}

/// Whole population read from one consistent snapshot
#[derive(Debug, Clone, Default)]
pub struct ScoringSnapshot {
    pub projects: Vec<Project>,
    pub branches: BranchForest,
    /// Posts keyed by owning branch, each carrying its interactions
    pub posts: HashMap<Uuid, Vec<Post>>,
    /// Interactions that target a branch directly, keyed by branch
    pub branch_interactions: HashMap<Uuid, Vec<Interaction>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Branch,
    Project,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Project => "project",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDimension {
    Activity,
    Popularity,
}

impl TrendDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Popularity => "popularity",
        }
    }
}

impl FromStr for TrendDimension {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "activity" => Ok(Self::Activity),
            "popularity" => Ok(Self::Popularity),
            other => Err(AppError::BadRequest(format!(
                "Invalid dimension: {}. Must be one of: activity, popularity",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TrendDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Values written back for one branch or project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityScore {
    pub kind: EntityKind,
    pub id: Uuid,
    pub activity: i64,
    pub popularity: i64,
    pub trending_activity: bool,
    pub trending_popularity: bool,
}

impl EntityScore {
    fn new(kind: EntityKind, id: Uuid, activity: i64, popularity: i64) -> Self {
        Self {
            kind,
            id,
            activity,
            popularity,
            trending_activity: false,
            trending_popularity: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    pub branches: Vec<EntityScore>,
    pub projects: Vec<EntityScore>,
}

impl ScoreBoard {
    pub fn trending_count(&self, kind: EntityKind, dimension: TrendDimension) -> usize {
        let scores = match kind {
            EntityKind::Branch => &self.branches,
            EntityKind::Project => &self.projects,
        };
        scores
            .iter()
            .filter(|s| match dimension {
                TrendDimension::Activity => s.trending_activity,
                TrendDimension::Popularity => s.trending_popularity,
            })
            .count()
    }
}

/// Net weight of the interactions created inside the window
pub fn net_popularity(interactions: &[Interaction], window: ScoringWindow) -> i64 {
    interactions
        .iter()
        .filter(|i| window.contains(i.created_at))
        .map(|i| i.interaction_type.weight())
        .sum()
}

/// Posts created in window plus direct child branches created in window
pub fn branch_activity(snapshot: &ScoringSnapshot, branch_id: Uuid, window: ScoringWindow) -> i64 {
    let posts = snapshot
        .posts
        .get(&branch_id)
        .map(|posts| posts.iter().filter(|p| window.contains(p.created_at)).count())
        .unwrap_or(0);

    let children = snapshot
        .branches
        .children_of(branch_id)
        .filter(|child| window.contains(child.created_at))
        .count();

    (posts + children) as i64
}

/// Branch-level interactions plus the interactions on every post of the branch
pub fn branch_popularity(
    snapshot: &ScoringSnapshot,
    branch_id: Uuid,
    window: ScoringWindow,
) -> i64 {
    let own = snapshot
        .branch_interactions
        .get(&branch_id)
        .map(|interactions| net_popularity(interactions, window))
        .unwrap_or(0);

    let from_posts: i64 = snapshot
        .posts
        .get(&branch_id)
        .map(|posts| {
            posts
                .iter()
                .map(|p| net_popularity(&p.interactions, window))
                .sum()
        })
        .unwrap_or(0);

    own + from_posts
}

/// Element at index floor(n/2) of the ascending sort; `None` for no scores
pub fn median(scores: &[i64]) -> Option<i64> {
    if scores.is_empty() {
        return None;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_unstable();
    Some(sorted[sorted.len() / 2])
}

/// Recompute both trending flags for a population. Every flag is
/// overwritten, so stale flags from an earlier pass never survive.
pub fn apply_trending_flags(scores: &mut [EntityScore]) {
    let activity: Vec<i64> = scores.iter().map(|s| s.activity).collect();
    let popularity: Vec<i64> = scores.iter().map(|s| s.popularity).collect();

    let (Some(activity_median), Some(popularity_median)) = (median(&activity), median(&popularity))
    else {
        return;
    };

    for score in scores.iter_mut() {
        score.trending_activity = score.activity >= activity_median;
        score.trending_popularity = score.popularity >= popularity_median;
    }
}

/// Score every branch and project in the snapshot
pub fn score_population(snapshot: &ScoringSnapshot, window: ScoringWindow) -> ScoreBoard {
    let mut branches: Vec<EntityScore> = snapshot
        .branches
        .iter()
        .map(|branch| {
            EntityScore::new(
                EntityKind::Branch,
                branch.id,
                branch_activity(snapshot, branch.id, window),
                branch_popularity(snapshot, branch.id, window),
            )
        })
        .collect();
    branches.sort_by_key(|s| s.id);

    let by_branch: HashMap<Uuid, &EntityScore> = branches.iter().map(|s| (s.id, s)).collect();

    let mut projects: Vec<EntityScore> = snapshot
        .projects
        .iter()
        .map(|project| {
            let (activity, popularity) = snapshot
                .branches
                .project_branches(project.id)
                .filter_map(|b| by_branch.get(&b.id))
                .fold((0, 0), |(a, p), s| (a + s.activity, p + s.popularity));
            EntityScore::new(EntityKind::Project, project.id, activity, popularity)
        })
        .collect();

    apply_trending_flags(&mut branches);
    apply_trending_flags(&mut projects);

    ScoreBoard { branches, projects }
}
