//! Presentation capability used by the handlers.
//!
//! This module provides:
//! - [`Prompter`] - Trait for asking the operator a question
//! - [`Secret`] - A password wrapper that prevents accidental logging
//! - [`MessageKind`] - Severity of a one-way message
//! - [`ScriptedPrompter`] - Replays canned answers, for tests
//!
//! Every prompt blocks the calling thread until the operator answers. The
//! bridge calls handlers on a blocking worker for this reason.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

mod scripted;

pub use scripted::{Answer, Prompt, ScriptedPrompter};

/// A password or passphrase typed by the operator.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the memory is wiped when the secret is dropped. Serializes as a plain
/// string so result types can carry it without an intermediate copy.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// Severity of a one-way message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// Asks the human operator for decisions.
///
/// `None` means the operator dismissed the prompt without answering. An
/// implementation may give up on a prompt after a timeout; that counts as a
/// dismissal too, so a handler falls back to declining.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question.
    fn confirm(&self, title: &str, text: &str) -> Option<bool>;

    /// Ask for a password with hidden input.
    fn password(&self, title: &str, text: &str) -> Option<Secret>;

    /// Ask for a line of visible text.
    fn entry(&self, title: &str, text: &str) -> Option<String>;

    /// Ask the operator to pick one of `items`, returning its index.
    ///
    /// An empty list is always dismissed.
    fn select(&self, title: &str, text: &str, items: &[String]) -> Option<usize>;

    /// Show a message that needs no answer.
    fn message(&self, kind: MessageKind, title: &str, text: &str);

    /// Ask a yes/no question and, on yes, ask for a password.
    ///
    /// A dismissed question counts as no. The password is `None` when the
    /// operator declined or dismissed the password prompt.
    fn confirm_with_password(&self, title: &str, text: &str) -> (bool, Option<Secret>) {
        if self.confirm(title, text).unwrap_or(false) {
            (true, self.password("Password", "Enter password"))
        } else {
            (false, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_secret_serializes_as_plain_string() {
        let secret = Secret::new("hunter2");
        assert_eq!(serde_json::to_string(&secret).unwrap(), r#""hunter2""#);

        let back: Secret = serde_json::from_str(r#""hunter2""#).unwrap();
        assert_eq!(back, secret);
        assert_eq!(Secret::default().expose(), "");
    }

    #[test]
    fn test_confirm_with_password_declined() {
        let prompter = ScriptedPrompter::new([Answer::Confirm(Some(false))]);
        let (approved, password) = prompter.confirm_with_password("t", "x");
        assert!(!approved);
        assert!(password.is_none());
        assert_eq!(prompter.prompts().len(), 1);
    }

    #[test]
    fn test_confirm_with_password_dismissed() {
        let prompter = ScriptedPrompter::new([Answer::Confirm(None)]);
        let (approved, password) = prompter.confirm_with_password("t", "x");
        assert!(!approved);
        assert!(password.is_none());
    }

    #[test]
    fn test_confirm_with_password_approved() {
        let prompter = ScriptedPrompter::new([
            Answer::Confirm(Some(true)),
            Answer::Password(Some("pw".into())),
        ]);
        let (approved, password) = prompter.confirm_with_password("t", "x");
        assert!(approved);
        assert_eq!(password, Some(Secret::new("pw")));
        assert_eq!(prompter.prompts().len(), 2);
    }
}
