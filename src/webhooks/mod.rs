//! Webhook handling for GitHub events.
//!
//! - [`signature`]: HMAC-SHA256 verification of deliveries
//! - [`parser`]: JSON payloads to [`GitHubEvent`]
//! - [`events`]: the typed events

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{CommentAction, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
