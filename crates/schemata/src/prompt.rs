//! Synchronous user confirmation.
//!
//! Deletion, duplication and placement ask the user when an operation is
//! ambiguous. The engine only sees the [`Prompt`] trait; a desktop front end
//! would open a dialog, while tests and the CLI answer from a script.

use std::{collections::VecDeque, fmt};

/// Answer to a [`Question`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    /// Abort the whole operation and roll back.
    Cancel,
}

/// A confirmation the engine needs before it can proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    /// The object already has a figure in the target diagram.
    DuplicateObject { name: String },
    /// Deleting a routine group would leave these routines in no group.
    DeleteOrphanRoutines { group: String, routines: Vec<String> },
    /// Removing a foreign key could also drop its local columns.
    DropForeignKeyColumns {
        foreign_key: String,
        columns: Vec<String>,
    },
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateObject { name } => {
                write!(f, "'{name}' is already shown in this diagram. Duplicate it?")
            }
            Self::DeleteOrphanRoutines { group, routines } => write!(
                f,
                "Deleting '{group}' leaves {} routine(s) ungrouped ({}). Delete them too?",
                routines.len(),
                routines.join(", ")
            ),
            Self::DropForeignKeyColumns {
                foreign_key,
                columns,
            } => write!(
                f,
                "Also drop the columns of '{foreign_key}' ({})?",
                columns.join(", ")
            ),
        }
    }
}

/// Source of answers to confirmations.
pub trait Prompt {
    fn ask(&mut self, question: &Question) -> Answer;
}

/// Answers every question the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompt(Answer);

impl FixedPrompt {
    pub fn new(answer: Answer) -> Self {
        Self(answer)
    }
}

impl Default for FixedPrompt {
    fn default() -> Self {
        Self(Answer::Yes)
    }
}

impl Prompt for FixedPrompt {
    fn ask(&mut self, _question: &Question) -> Answer {
        self.0
    }
}

/// Answers from a queue, then falls back to a fixed answer.
///
/// Every question asked is kept for inspection.
#[derive(Debug, Clone)]
pub struct ScriptedPrompt {
    answers: VecDeque<Answer>,
    fallback: Answer,
    asked: Vec<Question>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            fallback: Answer::Yes,
            asked: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: Answer) -> Self {
        self.fallback = fallback;
        self
    }

    /// Queues one more answer.
    pub fn push(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    pub fn asked(&self) -> &[Question] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &Question) -> Answer {
        self.asked.push(question.clone());
        self.answers.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompt_uses_queue_then_fallback() {
        let mut prompt = ScriptedPrompt::new([Answer::No]).with_fallback(Answer::Cancel);
        let question = Question::DuplicateObject {
            name: "orders".to_string(),
        };
        assert_eq!(prompt.ask(&question), Answer::No);
        assert_eq!(prompt.ask(&question), Answer::Cancel);
        assert_eq!(prompt.asked().len(), 2);
    }

    #[test]
    fn test_fixed_prompt() {
        let mut prompt = FixedPrompt::new(Answer::Cancel);
        let question = Question::DropForeignKeyColumns {
            foreign_key: "fk_1".to_string(),
            columns: vec!["customer_id".to_string()],
        };
        assert_eq!(prompt.ask(&question), Answer::Cancel);
        assert_eq!(FixedPrompt::default().ask(&question), Answer::Yes);
    }

    #[test]
    fn test_question_text() {
        let question = Question::DeleteOrphanRoutines {
            group: "billing".to_string(),
            routines: vec!["charge".to_string(), "refund".to_string()],
        };
        assert_eq!(
            question.to_string(),
            "Deleting 'billing' leaves 2 routine(s) ungrouped (charge, refund). Delete them too?"
        );
    }
}
