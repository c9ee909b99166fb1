/// Trending Service
///
/// Runs scoring passes against a [`TrendStore`] and serves trending lists.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::scorer::{
    score_population, EntityKind, EntityScore, ScoringWindow, TrendDimension,
};
use crate::db::TrendStore;
use crate::domain::Permission;
use crate::error::{AppError, Result};
use crate::metrics::trending as trending_metrics;

/// Entity whose scores were written successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredEntity {
    pub kind: EntityKind,
    pub id: Uuid,
}

/// Entity whose write failed, with the store's error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFailure {
    pub kind: EntityKind,
    pub id: Uuid,
    pub error: String,
}

/// Outcome of one scoring pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringReport {
    pub computed_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub succeeded: Vec<ScoredEntity>,
    pub failures: Vec<WriteFailure>,
}

impl ScoringReport {
    fn new(computed_at: DateTime<Utc>, window: ScoringWindow) -> Self {
        Self {
            computed_at,
            window_start: window.start,
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, score: &EntityScore, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.succeeded.push(ScoredEntity {
                kind: score.kind,
                id: score.id,
            }),
            Err(e) => {
                warn!(
                    kind = %score.kind,
                    id = %score.id,
                    error = %e,
                    "Failed to persist trend score"
                );
                self.failures.push(WriteFailure {
                    kind: score.kind,
                    id: score.id,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Trending list entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingEntry {
    pub kind: EntityKind,
    pub id: Uuid,
    pub name: String,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    pub activity: i64,
    pub popularity: i64,
    pub trending_activity: bool,
    pub trending_popularity: bool,
    #[serde(skip)]
    pub permissions: Permission,
}

pub struct TrendingService {
    store: Arc<dyn TrendStore>,
    window_days: i64,
}

impl TrendingService {
    pub fn new(store: Arc<dyn TrendStore>, window_days: i64) -> Self {
        Self { store, window_days }
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    pub async fn run_scoring_pass(&self) -> Result<ScoringReport> {
        self.run_scoring_pass_at(Utc::now()).await
    }

    /// Score the whole population as of `now` and persist every entity.
    ///
    /// A failed snapshot read aborts the pass. Failed writes do not; they are
    /// collected and surfaced together as [`AppError::ScoringIncomplete`].
    pub async fn run_scoring_pass_at(&self, now: DateTime<Utc>) -> Result<ScoringReport> {
        let started = Instant::now();
        let window = ScoringWindow::ending_at(now, self.window_days);

        let snapshot = match self.store.load_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to load scoring snapshot");
                trending_metrics::record_scoring_run("snapshot_error", started.elapsed());
                return Err(e);
            }
        };

        let board = score_population(&snapshot, window);
        let mut report = ScoringReport::new(now, window);

        for score in &board.branches {
            let outcome = self.store.write_branch_score(score).await;
            report.record(score, outcome);
        }
        for score in &board.projects {
            let outcome = self.store.write_project_score(score).await;
            report.record(score, outcome);
        }

        for kind in [EntityKind::Branch, EntityKind::Project] {
            for dimension in [TrendDimension::Activity, TrendDimension::Popularity] {
                trending_metrics::set_trending_entities(
                    kind,
                    dimension,
                    board.trending_count(kind, dimension),
                );
            }
        }
        trending_metrics::record_failed_writes(report.failures.len());

        if report.is_complete() {
            trending_metrics::record_scoring_run("success", started.elapsed());
            info!(
                branches = board.branches.len(),
                projects = board.projects.len(),
                duration_ms = started.elapsed().as_millis(),
                "Scoring pass completed"
            );
            Ok(report)
        } else {
            trending_metrics::record_scoring_run("partial", started.elapsed());
            error!(
                failed = report.failures.len(),
                attempted = report.attempted(),
                duration_ms = started.elapsed().as_millis(),
                "Scoring pass finished with failed writes"
            );
            Err(AppError::ScoringIncomplete(Box::new(report)))
        }
    }

    pub async fn list_trending(
        &self,
        kind: EntityKind,
        dimension: TrendDimension,
        viewer: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<TrendingEntry>> {
        let limit = limit.clamp(1, 100) as i64;
        self.store
            .list_trending(kind, dimension, viewer, limit)
            .await
    }
}
