/// Timeline API Handlers
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::services::TimelineScope;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-indexed
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

async fn respond(
    state: &AppState,
    scope: TimelineScope,
    viewer: Option<Uuid>,
    page: usize,
) -> Result<HttpResponse> {
    let page = state.timeline.timeline(scope, viewer, page).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/timeline/home
#[get("/timeline/home")]
pub async fn home_timeline(
    user: UserId,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    respond(&state, TimelineScope::Home(user.0), Some(user.0), query.page).await
}

/// GET /api/v1/timeline/users/{user_id}
#[get("/timeline/users/{user_id}")]
pub async fn profile_timeline(
    path: web::Path<Uuid>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    respond(
        &state,
        TimelineScope::Profile(path.into_inner()),
        viewer.0,
        query.page,
    )
    .await
}

/// GET /api/v1/timeline/global
#[get("/timeline/global")]
pub async fn global_timeline(
    viewer: Viewer,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    respond(&state, TimelineScope::Global, viewer.0, query.page).await
}

/// GET /api/v1/timeline/trending
#[get("/timeline/trending")]
pub async fn trending_timeline(
    viewer: Viewer,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    respond(&state, TimelineScope::Trending, viewer.0, query.page).await
}
