//! Core domain types for the cherry-pick bot.
//!
//! Identifiers live in [`ids`]; the request/outcome vocabulary shared by the
//! trigger parser and the pipeline lives in [`request`].

pub mod ids;
pub mod request;

pub use ids::{CommentId, DeliveryId, PrNumber, RepoId, Sha};
pub use request::{
    BranchOutcome, CherryPickRequest, DropReason, DroppedRequest, FailureCause, OutcomeResult,
    SkipReason, cherry_pick_branch, parse_cherry_pick_branch,
};
