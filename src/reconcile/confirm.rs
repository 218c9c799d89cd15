//! Confirmation policies for doubtful (relaxed) matches

use std::io::IsTerminal;
use std::str::FromStr;
use console::Term;
use crate::Error;

/// Decides whether a relaxed match should be merged.
pub trait ConfirmPolicy {
    fn confirm(&self, question: &str) -> bool;
}

/// Never merges a relaxed match (strict matching)
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysReject;

impl ConfirmPolicy for AlwaysReject {
    fn confirm(&self, _question: &str) -> bool {
        false
    }
}

/// Merges every relaxed match (relaxed matching)
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAccept;

impl ConfirmPolicy for AlwaysAccept {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

/// Asks the operator on the terminal until they answer y or n.
///
/// Without a terminal on both ends nobody can answer, so every question is
/// declined. Empty answers are asked again, up to `MAX_EMPTY_ANSWERS` in a
/// row, after which the input is taken as closed.
pub struct InteractivePrompt {
    term: Term,
}

const MAX_EMPTY_ANSWERS: usize = 3;

impl InteractivePrompt {
    pub fn new() -> Self {
        Self::with_term(Term::stderr())
    }

    /// Prompt on `term` instead of stderr
    pub fn with_term(term: Term) -> Self {
        Self { term }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term() && std::io::stdin().is_terminal()
    }
}

impl Default for InteractivePrompt {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl ConfirmPolicy for InteractivePrompt {
    fn confirm(&self, question: &str) -> bool {
        if !self.is_interactive() {
            tracing::warn!("No terminal to ask \"{}\", answering no", question);
            return false;
        }

        let mut empty_answers = 0;
        loop {
            if let Err(e) = self.term.write_str(&format!("{} [y/n] ", question)) {
                tracing::warn!("Could not prompt for confirmation: {}", e);
                return false;
            }
            let answer = match self.term.read_line() {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!("Could not read confirmation answer: {}", e);
                    return false;
                }
            };

            if let Some(accepted) = parse_answer(&answer) {
                return accepted;
            }
            if answer.trim().is_empty() {
                empty_answers += 1;
                if empty_answers >= MAX_EMPTY_ANSWERS {
                    tracing::warn!("No answer to \"{}\", answering no", question);
                    return false;
                }
            } else {
                empty_answers = 0;
            }
        }
    }
}

/// How relaxed matches are handled during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingMode {
    /// Only strict matches are merged
    #[default]
    Strict,
    /// The operator confirms each relaxed match
    Interactive,
    /// Relaxed matches are merged without asking
    Relaxed,
}

impl MatchingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchingMode::Strict => "strict",
            MatchingMode::Interactive => "interactive",
            MatchingMode::Relaxed => "relaxed",
        }
    }

    /// Build the confirmation policy for this mode
    pub fn policy(&self) -> Box<dyn ConfirmPolicy> {
        match self {
            MatchingMode::Strict => Box::new(AlwaysReject),
            MatchingMode::Interactive => Box::new(InteractivePrompt::new()),
            MatchingMode::Relaxed => Box::new(AlwaysAccept),
        }
    }
}

impl FromStr for MatchingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" | "s" => Ok(MatchingMode::Strict),
            "interactive" | "i" => Ok(MatchingMode::Interactive),
            "relaxed" | "r" => Ok(MatchingMode::Relaxed),
            _ => Err(Error::Parse(format!("Unknown matching mode: {}", s))),
        }
    }
}

impl std::fmt::Display for MatchingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
