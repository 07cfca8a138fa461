//! Question sources: the only place user interaction happens.
//!
//! The checkpoint engine never talks to a terminal directly. It asks a
//! [`QuestionSource`] for text, a choice among enumerated options, or a
//! yes/no confirmation, always supplying a default.

use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, Stdin, Stdout, Write};

/// A prompt presented to the user, identified by a stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
}

impl Question {
    pub const fn new(id: &'static str, text: &'static str) -> Self {
        Self { id, text }
    }
}

/// One selectable option of a choice question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Canonical identifier returned to the caller
    pub id: &'static str,
    /// Human readable label
    pub label: &'static str,
}

/// Supplies answers for prompts.
///
/// Implementations must not depend on state the engine can observe; calling
/// the same method twice with the same prompt is always allowed.
pub trait QuestionSource {
    /// Ask for free text. Empty input resolves to `default`.
    fn ask_text(&mut self, question: &Question, default: &str) -> io::Result<String>;

    /// Ask to pick one of `options`; returns the chosen option's id.
    fn ask_choice(
        &mut self,
        question: &Question,
        options: &[ChoiceOption],
        default: &str,
    ) -> io::Result<String>;

    /// Ask a yes/no question.
    fn ask_confirm(&mut self, question: &Question, default: bool) -> io::Result<bool>;
}

/// Line-oriented prompts over any reader/writer pair.
pub struct TerminalQuestions<R, W> {
    input: R,
    output: W,
}

impl TerminalQuestions<io::StdinLock<'static>, Stdout> {
    /// Prompts on the process's stdin/stdout
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalQuestions<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompter and hand back the writer (used by tests)
    pub fn into_output(self) -> W {
        self.output
    }

    /// Read one trimmed line; `None` on EOF or blank input
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            // EOF: behave like an empty answer so scripted stdin never hangs
            writeln!(self.output)?;
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

impl<R: BufRead, W: Write> QuestionSource for TerminalQuestions<R, W> {
    fn ask_text(&mut self, question: &Question, default: &str) -> io::Result<String> {
        if default.is_empty() {
            write!(self.output, "{}: ", question.text)?;
        } else {
            write!(self.output, "{} [{}]: ", question.text, default)?;
        }
        self.output.flush()?;

        Ok(self
            .read_answer()?
            .unwrap_or_else(|| default.to_string()))
    }

    fn ask_choice(
        &mut self,
        question: &Question,
        options: &[ChoiceOption],
        default: &str,
    ) -> io::Result<String> {
        writeln!(self.output, "\n{}", question.text)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, option.label)?;
        }

        let default_index = options
            .iter()
            .position(|o| o.id == default)
            .map(|i| i + 1)
            .unwrap_or(1);
        write!(self.output, "Select [{default_index}]: ")?;
        self.output.flush()?;

        let Some(answer) = self.read_answer()? else {
            return Ok(default.to_string());
        };

        // Accept either the option number or its id
        let chosen = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i))
            .or_else(|| {
                options
                    .iter()
                    .find(|o| o.id.eq_ignore_ascii_case(&answer))
            });

        Ok(chosen.map_or_else(|| default.to_string(), |o| o.id.to_string()))
    }

    fn ask_confirm(&mut self, question: &Question, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        write!(self.output, "{} [{}] ", question.text, hint)?;
        self.output.flush()?;

        let answer = self.read_answer()?.map(|a| a.to_lowercase());
        Ok(match answer.as_deref() {
            Some("y" | "yes") => true,
            Some("n" | "no") => false,
            _ => default,
        })
    }
}

/// A canned answer for [`ScriptedQuestions`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedAnswer {
    Text(String),
    Choice(String),
    Confirm(bool),
}

/// Non-interactive question source driven by a script.
///
/// Answers are queued per question id and consumed in order. Questions with
/// no queued answer resolve to their default. Every question asked is logged
/// so callers can assert on what was (and was not) asked.
#[derive(Debug, Default)]
pub struct ScriptedQuestions {
    answers: HashMap<&'static str, VecDeque<ScriptedAnswer>>,
    asked: Vec<&'static str>,
}

impl ScriptedQuestions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, id: &'static str, value: impl Into<String>) -> Self {
        self.push(id, ScriptedAnswer::Text(value.into()));
        self
    }

    pub fn choice(mut self, id: &'static str, value: impl Into<String>) -> Self {
        self.push(id, ScriptedAnswer::Choice(value.into()));
        self
    }

    pub fn confirm(mut self, id: &'static str, value: bool) -> Self {
        self.push(id, ScriptedAnswer::Confirm(value));
        self
    }

    /// Ids of every question asked, in order
    pub fn asked(&self) -> &[&'static str] {
        &self.asked
    }

    /// How many times the question with `id` was asked
    pub fn times_asked(&self, id: &str) -> usize {
        self.asked.iter().filter(|a| **a == id).count()
    }

    fn push(&mut self, id: &'static str, answer: ScriptedAnswer) {
        self.answers.entry(id).or_default().push_back(answer);
    }

    fn next(&mut self, question: &Question) -> Option<ScriptedAnswer> {
        self.asked.push(question.id);
        self.answers.get_mut(question.id)?.pop_front()
    }
}

impl QuestionSource for ScriptedQuestions {
    fn ask_text(&mut self, question: &Question, default: &str) -> io::Result<String> {
        match self.next(question) {
            Some(ScriptedAnswer::Text(v) | ScriptedAnswer::Choice(v)) => Ok(v),
            Some(ScriptedAnswer::Confirm(_)) => Err(mismatch(question, "text")),
            None => Ok(default.to_string()),
        }
    }

    fn ask_choice(
        &mut self,
        question: &Question,
        _options: &[ChoiceOption],
        default: &str,
    ) -> io::Result<String> {
        match self.next(question) {
            Some(ScriptedAnswer::Choice(v) | ScriptedAnswer::Text(v)) => Ok(v),
            Some(ScriptedAnswer::Confirm(_)) => Err(mismatch(question, "choice")),
            None => Ok(default.to_string()),
        }
    }

    fn ask_confirm(&mut self, question: &Question, default: bool) -> io::Result<bool> {
        match self.next(question) {
            Some(ScriptedAnswer::Confirm(v)) => Ok(v),
            Some(_) => Err(mismatch(question, "confirmation")),
            None => Ok(default),
        }
    }
}

fn mismatch(question: &Question, expected: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("scripted answer for '{}' is not a {}", question.id, expected),
    )
}
