//! Parsing for cherry-pick requests expressed in comments and labels.
//!
//! # Supported Forms
//!
//! - `/cherrypick <branch>` on its own line in a pull request comment
//! - A `cherrypick/<branch>` label on the pull request (prefix configurable)
//!
//! # Example
//!
//! ```
//! use cherry_picker::commands::{parse_cherrypick_commands, parse_cherrypick_label};
//!
//! let comment = "LGTM, needed on the release too.\n/cherrypick release-1.6";
//! assert_eq!(parse_cherrypick_commands(comment), vec!["release-1.6"]);
//!
//! assert_eq!(parse_cherrypick_label("cherrypick/release-1.5", "cherrypick/"), Some("release-1.5"));
//! ```

mod parser;

pub use parser::{
    CHERRYPICK_COMMAND, DEFAULT_LABEL_PREFIX, contains_cherrypick_command, is_valid_branch_name,
    parse_cherrypick_commands, parse_cherrypick_label,
};
