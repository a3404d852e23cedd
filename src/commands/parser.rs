//! Parser for `/cherrypick` commands and `cherrypick/` labels.
//!
//! Everything here is pure and never panics on arbitrary input; the
//! proptests at the bottom of the file hold it to that.

/// The command token recognised at the start of a comment line.
pub const CHERRYPICK_COMMAND: &str = "/cherrypick";

/// Default label prefix that requests a cherry-pick (`cherrypick/<branch>`).
pub const DEFAULT_LABEL_PREFIX: &str = "cherrypick/";

/// Extracts every `/cherrypick <branch>` target from comment text, in order.
///
/// # Parsing Rules
///
/// - A command occupies a whole line and must start at column zero
/// - The command token is case-sensitive and must be followed by whitespace
/// - Trailing whitespace and carriage returns are stripped before matching
/// - The target is the rest of the line, trimmed; it is not validated here
/// - Lines that don't match are ignored (approvals, status lines, prose)
///
/// # Examples
///
/// ```
/// use cherry_picker::commands::parse_cherrypick_commands;
///
/// assert_eq!(parse_cherrypick_commands("/cherrypick release-1.5\r"), vec!["release-1.5"]);
/// assert!(parse_cherrypick_commands("/approve").is_empty());
/// ```
pub fn parse_cherrypick_commands(text: &str) -> Vec<&str> {
    text.lines().filter_map(parse_command_line).collect()
}

/// Returns true if the text contains at least one command line.
///
/// Cheaper than [`parse_cherrypick_commands`] when only a yes/no is needed,
/// e.g. to decide whether a comment is worth an API round-trip.
pub fn contains_cherrypick_command(text: &str) -> bool {
    text.lines().any(|line| parse_command_line(line).is_some())
}

fn parse_command_line(line: &str) -> Option<&str> {
    let line = line.trim_end();
    let rest = line.strip_prefix(CHERRYPICK_COMMAND)?;
    // `/cherrypicker foo` is not our command.
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let target = rest.trim();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

/// Extracts the target branch from a label such as `cherrypick/release-1.5`.
pub fn parse_cherrypick_label<'a>(label: &'a str, prefix: &str) -> Option<&'a str> {
    let target = label.strip_prefix(prefix)?;
    if target.is_empty() { None } else { Some(target) }
}

/// Checks a requested target against git's branch naming rules.
///
/// This is the subset of `git check-ref-format --branch` that can be decided
/// without a repository.
pub fn is_valid_branch_name(name: &str) -> bool {
    if name.is_empty() || name == "@" {
        return false;
    }
    if name.starts_with('-') || name.starts_with('/') || name.ends_with('/') {
        return false;
    }
    if name.ends_with('.') || name.contains("..") || name.contains("//") || name.contains("@{") {
        return false;
    }
    if name
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || "~^:?*[\\".contains(c))
    {
        return false;
    }
    name.split('/')
        .all(|component| !component.starts_with('.') && !component.ends_with(".lock"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==================== Comment commands ====================

    #[test]
    fn single_command_parses() {
        assert_eq!(parse_cherrypick_commands("/cherrypick stage"), vec!["stage"]);
    }

    #[test]
    fn trailing_carriage_return_is_ignored() {
        assert_eq!(
            parse_cherrypick_commands("/cherrypick release-1.5\r"),
            parse_cherrypick_commands("/cherrypick release-1.5")
        );
    }

    #[test]
    fn multiple_lines_yield_multiple_targets() {
        let text = "Please backport.\n/cherrypick release-1.5\r\n/cherrypick release-1.6\n";
        assert_eq!(
            parse_cherrypick_commands(text),
            vec!["release-1.5", "release-1.6"]
        );
    }

    #[test]
    fn noise_is_ignored() {
        for text in [
            "/approve",
            "Automatic merge from submit-queue.",
            "a review comment",
            "/lgtm\n/hold",
            "",
        ] {
            assert!(parse_cherrypick_commands(text).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn command_must_start_the_line() {
        assert!(parse_cherrypick_commands("please /cherrypick stage").is_empty());
        assert!(parse_cherrypick_commands("  /cherrypick stage").is_empty());
    }

    #[test]
    fn command_requires_separator_and_target() {
        assert!(parse_cherrypick_commands("/cherrypick").is_empty());
        assert!(parse_cherrypick_commands("/cherrypick   \r").is_empty());
        assert!(parse_cherrypick_commands("/cherrypicker stage").is_empty());
    }

    #[test]
    fn command_is_case_sensitive() {
        assert!(parse_cherrypick_commands("/CherryPick stage").is_empty());
    }

    #[test]
    fn tab_separator_is_accepted() {
        assert_eq!(parse_cherrypick_commands("/cherrypick\tstage"), vec!["stage"]);
    }

    #[test]
    fn contains_agrees_with_parse() {
        assert!(contains_cherrypick_command("lgtm\n/cherrypick stage"));
        assert!(!contains_cherrypick_command("/approve"));
    }

    // ==================== Labels ====================

    #[test]
    fn label_with_prefix_parses() {
        assert_eq!(
            parse_cherrypick_label("cherrypick/release-1.5", DEFAULT_LABEL_PREFIX),
            Some("release-1.5")
        );
    }

    #[test]
    fn label_without_prefix_or_target_is_ignored() {
        assert_eq!(parse_cherrypick_label("lgtm", DEFAULT_LABEL_PREFIX), None);
        assert_eq!(parse_cherrypick_label("cherrypick/", DEFAULT_LABEL_PREFIX), None);
        assert_eq!(
            parse_cherrypick_label("Cherrypick/release-1.5", DEFAULT_LABEL_PREFIX),
            None
        );
    }

    #[test]
    fn label_prefix_is_configurable() {
        assert_eq!(parse_cherrypick_label("backport:v2", "backport:"), Some("v2"));
    }

    // ==================== Branch validation ====================

    #[test]
    fn ordinary_branch_names_are_valid() {
        for name in ["stage", "release-1.5", "release/v2.0", "main", "feature_x"] {
            assert!(is_valid_branch_name(name), "{name}");
        }
    }

    #[test]
    fn malformed_branch_names_are_rejected() {
        for name in [
            "",
            "@",
            "-oops",
            "/leading",
            "trailing/",
            "trailing.",
            "a..b",
            "a//b",
            "a@{b",
            "has space",
            "tilde~1",
            "caret^",
            "colon:x",
            "glob*",
            "q?",
            "br[acket",
            "back\\slash",
            "x.lock",
            "dir/.hidden",
            "release-1.5 please",
        ] {
            assert!(!is_valid_branch_name(name), "{name:?}");
        }
    }

    // ==================== Robustness ====================

    proptest! {
        /// Arbitrary text never panics.
        #[test]
        fn arbitrary_text_never_panics(text in ".*") {
            let _ = parse_cherrypick_commands(&text);
            let _ = contains_cherrypick_command(&text);
            let _ = is_valid_branch_name(&text);
            let _ = parse_cherrypick_label(&text, DEFAULT_LABEL_PREFIX);
        }

        /// A well-formed command round-trips through the parser regardless of
        /// trailing whitespace.
        #[test]
        fn well_formed_command_roundtrips(
            branch in "[a-z][a-z0-9./_-]{0,30}",
            trailer in "[ \t\r]{0,3}",
        ) {
            let text = format!("/cherrypick {}{}", branch, trailer);
            prop_assert_eq!(parse_cherrypick_commands(&text), vec![branch.as_str()]);
        }

        /// Extracted targets never carry surrounding whitespace.
        #[test]
        fn targets_are_trimmed(text in ".*") {
            for target in parse_cherrypick_commands(&text) {
                prop_assert_eq!(target, target.trim());
                prop_assert!(!target.is_empty());
            }
        }
    }
}
