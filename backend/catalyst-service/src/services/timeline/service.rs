/// Timeline Service
///
/// Resolves which users feed a timeline, loads their records through the
/// source cache, and hands them to the composer.
use catalyst_cache::{CacheKey, JsonCache};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use super::composer::{compose, Page, PageRequest, SourceUser, TimelineEntry, TimelineFilter};
use crate::db::TimelineStore;
use crate::error::{AppError, Result};
use crate::metrics::timeline as timeline_metrics;

/// Whose records make up a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineScope {
    /// A single user's own activity
    Profile(Uuid),
    /// Everyone the viewer follows
    Home(Uuid),
    Global,
    /// Global sources narrowed to trending branches and projects
    Trending,
}

impl TimelineScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile(_) => "profile",
            Self::Home(_) => "home",
            Self::Global => "global",
            Self::Trending => "trending",
        }
    }

    fn filter(&self) -> TimelineFilter {
        match self {
            Self::Trending => TimelineFilter::TrendingOnly,
            _ => TimelineFilter::All,
        }
    }
}

pub struct TimelineService {
    store: Arc<dyn TimelineStore>,
    cache: JsonCache,
    page_size: usize,
    global_source_limit: i64,
}

impl TimelineService {
    pub fn new(
        store: Arc<dyn TimelineStore>,
        cache: JsonCache,
        page_size: usize,
        global_source_limit: i64,
    ) -> Self {
        Self {
            store,
            cache,
            page_size,
            global_source_limit,
        }
    }

    pub async fn timeline(
        &self,
        scope: TimelineScope,
        viewer: Option<Uuid>,
        page: usize,
    ) -> Result<Page<TimelineEntry>> {
        let request = PageRequest::new(page, self.page_size)?;
        let started = Instant::now();

        let source_ids = self.source_ids(scope).await?;
        let sources = self.load_sources(&source_ids).await?;

        if let TimelineScope::Profile(user_id) = scope {
            if sources.is_empty() {
                return Err(AppError::NotFound(format!("user {} not found", user_id)));
            }
        }

        let page = compose(&sources, viewer, scope.filter(), request);

        timeline_metrics::observe_compose(scope.as_str(), started.elapsed());
        debug!(
            scope = scope.as_str(),
            sources = sources.len(),
            total_items = page.total_items,
            page = page.page,
            "Timeline composed"
        );

        Ok(page)
    }

    /// Drop a user's cached source record after their data changed
    pub async fn invalidate_user(&self, user_id: Uuid) {
        let key = CacheKey::timeline_sources(user_id);
        if let Err(e) = self.cache.invalidate(&key).await {
            warn!(user_id = %user_id, error = %e, "Failed to invalidate timeline sources");
        }
    }

    async fn source_ids(&self, scope: TimelineScope) -> Result<Vec<Uuid>> {
        match scope {
            TimelineScope::Profile(user_id) => Ok(vec![user_id]),
            TimelineScope::Home(viewer) => self.followed_ids(viewer).await,
            TimelineScope::Global | TimelineScope::Trending => {
                self.store.all_user_ids(self.global_source_limit).await
            }
        }
    }

    async fn followed_ids(&self, viewer: Uuid) -> Result<Vec<Uuid>> {
        let key = CacheKey::following(viewer);

        match self.cache.get::<Vec<Uuid>>(&key).await {
            Ok(Some(ids)) => return Ok(ids),
            Ok(None) => {}
            Err(e) => warn!(viewer = %viewer, error = %e, "Following cache read failed"),
        }

        let ids = self.store.followed_user_ids(viewer).await?;

        if let Err(e) = self.cache.set(&key, &ids).await {
            warn!(viewer = %viewer, error = %e, "Following cache write failed");
        }

        Ok(ids)
    }

    /// Unknown users are skipped
    async fn load_sources(&self, user_ids: &[Uuid]) -> Result<Vec<SourceUser>> {
        let mut sources = Vec::with_capacity(user_ids.len());

        for &user_id in user_ids {
            if let Some(source) = self.load_source(user_id).await? {
                sources.push(source);
            }
        }

        Ok(sources)
    }

    async fn load_source(&self, user_id: Uuid) -> Result<Option<SourceUser>> {
        let key = CacheKey::timeline_sources(user_id);

        match self.cache.get::<SourceUser>(&key).await {
            Ok(Some(source)) => return Ok(Some(source)),
            Ok(None) => {}
            Err(e) => warn!(user_id = %user_id, error = %e, "Timeline source cache read failed"),
        }

        let source = self.store.load_source(user_id).await?;

        if let Some(source) = &source {
            if let Err(e) = self.cache.set(&key, source).await {
                warn!(user_id = %user_id, error = %e, "Timeline source cache write failed");
            }
        }

        Ok(source)
    }
}
