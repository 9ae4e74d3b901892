//! Command-line parsing shared by every `HandleCommand` call.
//!
//! A command is `<verb> <argument>`, verb case-insensitive; `:<argument>`
//! is a shorthand for `pose <argument>`.

use crate::error::{Error, Result};

/// Split a raw command line into `(verb, argument)`.
pub fn parse_command(raw: &str) -> Result<(String, String)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyCommand);
    }
    if let Some(rest) = trimmed.strip_prefix(':') {
        return Ok(("pose".to_string(), rest.trim().to_string()));
    }
    match trimmed.split_once(char::is_whitespace) {
        Some((verb, argument)) => Ok((verb.to_ascii_lowercase(), argument.trim().to_string())),
        None => Ok((trimmed.to_ascii_lowercase(), String::new())),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::splits_on_first_whitespace("say hello there", "say", "hello there")]
    #[case::lowercases_verb_only("SAY Hello", "say", "Hello")]
    #[case::colon_prefix_aliases_pose(":waves hello", "pose", "waves hello")]
    #[case::verb_with_no_argument("look", "look", "")]
    #[case::collapses_repeated_leading_whitespace("  say   hi", "say", "hi")]
    fn parses_known_shapes(#[case] raw: &str, #[case] verb: &str, #[case] argument: &str) {
        assert_eq!(parse_command(raw).unwrap(), (verb.to_string(), argument.to_string()));
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace_only("   ")]
    fn empty_or_whitespace_only_command_is_rejected(#[case] raw: &str) {
        assert!(matches!(parse_command(raw), Err(Error::EmptyCommand)));
    }
}
