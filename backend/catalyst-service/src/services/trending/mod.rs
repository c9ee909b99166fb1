pub mod scorer;
pub mod service;

pub use scorer::{
    apply_trending_flags, median, score_population, EntityKind, EntityScore, ScoreBoard,
    ScoringSnapshot, ScoringWindow, TrendDimension, DEFAULT_WINDOW_DAYS,
};
pub use service::{ScoredEntity, ScoringReport, TrendingEntry, TrendingService, WriteFailure};
