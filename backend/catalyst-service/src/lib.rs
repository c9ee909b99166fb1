pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

// Re-export the two core engines
pub use services::{ScoringReport, TimelineScope, TimelineService, TrendingService};
