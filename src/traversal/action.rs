//! Operator actions and their line syntax.

use std::str::FromStr;

use crate::error::LabelError;

/// One operator action, mapped 1:1 to a traversal transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Show the current image without changing state.
    Load,
    /// Record the plate text for the current image and move on.
    Submit(String),
    /// Mark the current image unusable and move on.
    Flag,
    /// Return to the previously committed image.
    Back,
}

impl FromStr for Action {
    type Err = LabelError;

    /// Parses `submit <text>`, `unsure <text>`, `flag`, `back`, or
    /// `show`/`load`. Verbs are case-insensitive; a blank line is `Load`.
    /// The plate text is everything after the verb, trimmed, and may be empty.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "" | "show" | "load" => Ok(Action::Load),
            "submit" | "unsure" => Ok(Action::Submit(rest.to_string())),
            "flag" if rest.is_empty() => Ok(Action::Flag),
            "back" if rest.is_empty() => Ok(Action::Back),
            _ => Err(LabelError::UnknownAction(line.to_string())),
        }
    }
}
