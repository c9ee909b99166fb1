//! Trending Refresh Background Job
//!
//! Re-runs the scoring pass on a fixed interval so activity, popularity and
//! trending flags track the rolling window without any request driving them.
//! A failed cycle is logged and the loop carries on with the next one.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::config::TrendingConfig;
use crate::error::AppError;
use crate::services::TrendingService;

/// How often to rescore (every 15 minutes)
const REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Delay before the first pass so the pool and caches can settle
const STARTUP_DELAY: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct TrendingRefreshConfig {
    pub enabled: bool,
    pub interval: Duration,
    pub startup_delay: Duration,
}

impl Default for TrendingRefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: REFRESH_INTERVAL,
            startup_delay: STARTUP_DELAY,
        }
    }
}

impl From<&TrendingConfig> for TrendingRefreshConfig {
    fn from(config: &TrendingConfig) -> Self {
        Self {
            enabled: config.refresh_enabled,
            interval: Duration::from_secs(config.refresh_interval_secs),
            ..Self::default()
        }
    }
}

/// Start the trending refresh background job
pub async fn start_trending_refresh(service: Arc<TrendingService>, config: TrendingRefreshConfig) {
    if !config.enabled {
        tracing::info!("Trending refresh disabled by configuration");
        return;
    }

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        window_days = service.window_days(),
        "Starting trending refresh background job"
    );

    sleep(config.startup_delay).await;

    loop {
        run_refresh_cycle(&service).await;
        sleep(config.interval).await;
    }
}

/// Run one scoring pass and log its outcome. Returns whether every write landed.
pub async fn run_refresh_cycle(service: &TrendingService) -> bool {
    let cycle_start = Instant::now();

    match service.run_scoring_pass().await {
        Ok(report) => {
            tracing::info!(
                entities_scored = report.succeeded.len(),
                duration_ms = cycle_start.elapsed().as_millis(),
                "Trending refresh cycle completed"
            );
            true
        }
        Err(AppError::ScoringIncomplete(report)) => {
            for failure in &report.failures {
                tracing::warn!(
                    kind = %failure.kind,
                    id = %failure.id,
                    error = %failure.error,
                    "Trend score write failed"
                );
            }
            tracing::warn!(
                succeeded = report.succeeded.len(),
                failed = report.failures.len(),
                duration_ms = cycle_start.elapsed().as_millis(),
                "Trending refresh cycle incomplete"
            );
            false
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                duration_ms = cycle_start.elapsed().as_millis(),
                "Trending refresh cycle failed"
            );
            false
        }
    }
}
