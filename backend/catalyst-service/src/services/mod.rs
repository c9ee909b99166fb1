pub mod branches;
pub mod interactions;
pub mod timeline;
pub mod trending;

pub use branches::{BranchService, NewBranch};
pub use interactions::InteractionService;
pub use timeline::{TimelineScope, TimelineService};
pub use trending::{ScoringReport, TrendingService};
