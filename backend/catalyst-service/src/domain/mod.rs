pub mod branch_tree;
pub mod models;

pub use branch_tree::BranchForest;
pub use models::{
    Branch, Interaction, InteractionTarget, InteractionType, Permission, Post, Project, User,
    UserSummary,
};
