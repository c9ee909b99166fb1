/// Branch API Handlers
use actix_web::{post, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::NewBranch;

#[derive(Debug, Deserialize)]
pub struct ReparentRequest {
    /// `null` moves the branch to the project root
    pub parent_branch_id: Option<Uuid>,
}

/// POST /api/v1/projects/{project_id}/branches
#[post("/projects/{project_id}/branches")]
pub async fn create_branch(
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<NewBranch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let branch = state
        .branches
        .create_branch(path.into_inner(), user.0, body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(branch))
}

/// PUT /api/v1/branches/{branch_id}/parent
#[put("/branches/{branch_id}/parent")]
pub async fn reparent_branch(
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<ReparentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let branch = state
        .branches
        .reparent_branch(path.into_inner(), user.0, body.parent_branch_id)
        .await?;

    Ok(HttpResponse::Ok().json(branch))
}
