//! Scripted prompter for tests and headless runs.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{MessageKind, Prompter, Secret};

/// A canned answer for the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answer to [`Prompter::confirm`].
    Confirm(Option<bool>),
    /// Answer to [`Prompter::password`].
    Password(Option<String>),
    /// Answer to [`Prompter::entry`].
    Entry(Option<String>),
    /// Answer to [`Prompter::select`].
    Select(Option<usize>),
    /// The prompt ran out of time. Accepted by any kind of prompt.
    TimedOut,
}

impl Answer {
    fn kind(&self) -> &'static str {
        match self {
            Self::Confirm(_) => "confirm",
            Self::Password(_) => "password",
            Self::Entry(_) => "entry",
            Self::Select(_) => "select",
            Self::TimedOut => "timed out",
        }
    }
}

/// A prompt that was shown, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Confirm { title: String, text: String },
    Password { title: String, text: String },
    Entry { title: String, text: String },
    Select { title: String, text: String, items: Vec<String> },
    Message { kind: MessageKind, title: String, text: String },
}

/// Prompter that replays queued answers and records every prompt.
///
/// When the queue is empty, or the next answer is for a different kind of
/// prompt, the prompt is treated as dismissed.
///
/// # Thread Safety
///
/// State is kept behind a mutex, so one instance can be shared with the
/// bridge through an `Arc` while the test inspects it.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedPrompter {
    /// Create a prompter with the given answers queued.
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue another answer.
    pub fn push(&self, answer: Answer) {
        self.answers.lock().push_back(answer);
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().clone()
    }

    /// Number of answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }

    fn record(&self, prompt: Prompt) {
        self.prompts.lock().push(prompt);
    }

    /// Record `prompt` and take the next answer, if it fits.
    fn answer<T>(
        &self,
        prompt: Prompt,
        fits: impl FnOnce(Answer) -> Result<Option<T>, Answer>,
    ) -> Option<T> {
        let expected = match &prompt {
            Prompt::Confirm { .. } => "confirm",
            Prompt::Password { .. } => "password",
            Prompt::Entry { .. } => "entry",
            Prompt::Select { .. } => "select",
            Prompt::Message { .. } => "message",
        };
        self.record(prompt);

        let next = self.answers.lock().pop_front();
        match next {
            Some(Answer::TimedOut) => {
                debug!(expected, "scripted prompt timed out");
                None
            }
            Some(answer) => fits(answer).unwrap_or_else(|other| {
                warn!(
                    expected,
                    found = other.kind(),
                    "scripted answer does not fit, treating as dismissed"
                );
                None
            }),
            None => {
                warn!(expected, "no answer scripted, treating as dismissed");
                None
            }
        }
    }
}

impl fmt::Debug for ScriptedPrompter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedPrompter")
            .field("remaining", &self.remaining())
            .field("shown", &self.prompts.lock().len())
            .finish()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, title: &str, text: &str) -> Option<bool> {
        let prompt = Prompt::Confirm {
            title: title.to_string(),
            text: text.to_string(),
        };
        self.answer(prompt, |answer| match answer {
            Answer::Confirm(answer) => Ok(answer),
            other => Err(other),
        })
    }

    fn password(&self, title: &str, text: &str) -> Option<Secret> {
        let prompt = Prompt::Password {
            title: title.to_string(),
            text: text.to_string(),
        };
        self.answer(prompt, |answer| match answer {
            Answer::Password(answer) => Ok(answer.map(Secret::new)),
            other => Err(other),
        })
    }

    fn entry(&self, title: &str, text: &str) -> Option<String> {
        let prompt = Prompt::Entry {
            title: title.to_string(),
            text: text.to_string(),
        };
        self.answer(prompt, |answer| match answer {
            Answer::Entry(answer) => Ok(answer),
            other => Err(other),
        })
    }

    fn select(&self, title: &str, text: &str, items: &[String]) -> Option<usize> {
        let prompt = Prompt::Select {
            title: title.to_string(),
            text: text.to_string(),
            items: items.to_vec(),
        };
        self.answer(prompt, |answer| match answer {
            // Out-of-range picks are dismissals, like on a real list.
            Answer::Select(answer) => Ok(answer.filter(|&i| i < items.len())),
            other => Err(other),
        })
    }

    fn message(&self, kind: MessageKind, title: &str, text: &str) {
        self.record(Prompt::Message {
            kind,
            title: title.to_string(),
            text: text.to_string(),
        });
    }
}
