pub mod branches;
pub mod interactions;
pub mod timeline;
pub mod trending;

use actix_web::web;
use std::sync::Arc;

use crate::services::{BranchService, InteractionService, TimelineService, TrendingService};

pub use branches::{create_branch, reparent_branch};
pub use interactions::{add_interaction, count_interactions, remove_interaction};
pub use timeline::{global_timeline, home_timeline, profile_timeline, trending_timeline};
pub use trending::{get_trending, refresh_trending};

/// Shared state handed to every handler
pub struct AppState {
    pub trending: Arc<TrendingService>,
    pub timeline: Arc<TimelineService>,
    pub interactions: Arc<InteractionService>,
    pub branches: Arc<BranchService>,
}

/// Register all `/api/v1` routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(refresh_trending)
            .service(get_trending)
            .service(home_timeline)
            .service(profile_timeline)
            .service(global_timeline)
            .service(trending_timeline)
            .service(count_interactions)
            .service(add_interaction)
            .service(remove_interaction)
            .service(create_branch)
            .service(reparent_branch),
    );
}
