/// Trending API Handlers
///
/// HTTP endpoints for trending branches/projects and on-demand scoring
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, info};

use super::AppState;
use crate::error::{AppError, Result};
use crate::middleware::{UserId, Viewer};
use crate::services::trending::{EntityKind, TrendDimension};

/// Query parameters for GET /trending/{entity}
#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    /// "activity" or "popularity"
    #[serde(default = "default_dimension")]
    pub dimension: String,

    /// Limit (default: 20, max: 100)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_dimension() -> String {
    "popularity".to_string()
}

fn default_limit() -> usize {
    20
}

fn parse_entity(entity: &str) -> Result<EntityKind> {
    match entity {
        "branches" => Ok(EntityKind::Branch),
        "projects" => Ok(EntityKind::Project),
        other => Err(AppError::NotFound(format!(
            "unknown trending collection '{}', expected branches or projects",
            other
        ))),
    }
}

/// GET /api/v1/trending/{entity}
#[get("/trending/{entity}")]
pub async fn get_trending(
    path: web::Path<String>,
    query: web::Query<TrendingQuery>,
    viewer: Viewer,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let kind = parse_entity(&path)?;
    let dimension: TrendDimension = query.dimension.parse()?;

    debug!(
        kind = %kind,
        dimension = %dimension,
        limit = query.limit,
        "Trending request"
    );

    let items = state
        .trending
        .list_trending(kind, dimension, viewer.0, query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "entity": kind,
        "dimension": dimension,
        "count": items.len(),
        "items": items,
    })))
}

/// POST /api/v1/trending/refresh
///
/// Runs a full scoring pass for an identified caller. Partial write
/// failures come back as a 500 carrying the report.
#[post("/trending/refresh")]
pub async fn refresh_trending(
    user: UserId,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!(user_id = %user.0, "Manual trending refresh requested");
    let report = state.trending.run_scoring_pass().await?;
    Ok(HttpResponse::Ok().json(report))
}
