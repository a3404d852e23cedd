//! Effects-as-data for GitHub and Git operations.
//!
//! The pipeline describes every external call as a value of
//! [`GitHubEffect`] or [`GitEffect`] and hands it to an interpreter. This
//! keeps the decision logic free of transport details and lets the tests
//! observe exactly which calls were made.

pub mod git;
pub mod github;
pub mod interpreter;

pub use git::{GitEffect, GitResponse};
pub use github::{CommentData, GitHubEffect, GitHubResponse, PrData, PrState};
pub use interpreter::{GitHubInterpreter, GitInterpreter};
