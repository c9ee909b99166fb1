/// Interaction API Handlers
use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::domain::{InteractionTarget, InteractionType};
use crate::error::{AppError, Result};
use crate::middleware::UserId;

/// Body for POST/DELETE /interactions and query for GET /interactions/count
#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub target_type: String, // "post" or "branch"
    pub target_id: Uuid,
    pub interaction_type: String, // "LIKE", "SHARE", "BOOKMARK", "REPORT", "HIDE"
}

impl InteractionRequest {
    fn parse(&self) -> Result<(InteractionTarget, InteractionType)> {
        let target = match self.target_type.to_lowercase().as_str() {
            "post" => InteractionTarget::Post(self.target_id),
            "branch" => InteractionTarget::Branch(self.target_id),
            other => {
                return Err(AppError::BadRequest(format!(
                    "Invalid target type: {}. Must be one of: post, branch",
                    other
                )))
            }
        };
        let interaction_type = self.interaction_type.parse()?;
        Ok((target, interaction_type))
    }
}

/// POST /api/v1/interactions
#[post("/interactions")]
pub async fn add_interaction(
    user: UserId,
    body: web::Json<InteractionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (target, interaction_type) = body.parse()?;
    let interaction = state
        .interactions
        .add_interaction(user.0, target, interaction_type)
        .await?;

    Ok(HttpResponse::Created().json(interaction))
}

/// DELETE /api/v1/interactions
#[delete("/interactions")]
pub async fn remove_interaction(
    user: UserId,
    body: web::Json<InteractionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (target, interaction_type) = body.parse()?;
    state
        .interactions
        .remove_interaction(user.0, target, interaction_type)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/interactions/count
#[get("/interactions/count")]
pub async fn count_interactions(
    query: web::Query<InteractionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (target, interaction_type) = query.parse()?;
    let count = state.interactions.count(target, interaction_type).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "target": target,
        "interaction_type": interaction_type,
        "count": count,
    })))
}
