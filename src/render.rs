use std::io::{self, Write};

use crate::quiz::selector::QuestionSelector;
use crate::quiz::{Question, QuestionKind};
use crate::results::{OptionView, ResultEntry};
use crate::storage::record::{RecordId, RecordSummary};

/// Position of the current question, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(selector: &QuestionSelector) -> Self {
        Self {
            position: selector.cursor() + 1,
            total: selector.len(),
        }
    }

    pub fn is_last(&self) -> bool {
        self.position == self.total
    }
}

/// What the session controller draws through. Implementations only present; they
/// never decide anything about the quiz.
pub trait Renderer {
    fn display_welcome(&mut self, username: &str) -> io::Result<()>;

    /// Called on entering a question with unmarked options, and again after grading
    /// with every option marked.
    fn display_question(
        &mut self,
        question: &Question,
        options: &[OptionView],
        progress: Progress,
    ) -> io::Result<()>;

    fn display_result(&mut self, is_correct: bool, last_question: bool) -> io::Result<()>;

    fn display_complete(&mut self, score: usize, total: usize, record: &RecordId) -> io::Result<()>;

    fn display_summary_entry(
        &mut self,
        entry: &ResultEntry,
        index: usize,
        total: usize,
    ) -> io::Result<()>;
}

/// Line-oriented renderer for a terminal.
#[derive(Debug)]
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        self.out.flush()
    }

    pub fn records(&mut self, username: &str, records: &[RecordSummary]) -> io::Result<()> {
        writeln!(self.out, "{}'s saved answers", username)?;
        for (i, record) in records.iter().enumerate() {
            writeln!(self.out, "  {}) {}", i + 1, record.label)?;
        }
        writeln!(self.out, "Pick a number to open it, or /cancel to go back.")?;
        self.out.flush()
    }

    fn options(&mut self, options: &[OptionView]) -> io::Result<()> {
        for (i, option) in options.iter().enumerate() {
            writeln!(self.out, "  {}) {}", i + 1, option)?;
        }
        Ok(())
    }

    fn verdict(&mut self, is_correct: bool) -> io::Result<()> {
        writeln!(self.out, "{}", if is_correct { "Correct!" } else { "Incorrect" })
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn display_welcome(&mut self, username: &str) -> io::Result<()> {
        self.say(format!("Welcome, {}!", username))
    }

    fn display_question(
        &mut self,
        question: &Question,
        options: &[OptionView],
        progress: Progress,
    ) -> io::Result<()> {
        writeln!(
            self.out,
            "({}/{}) {}",
            progress.position,
            progress.total,
            question.text()
        )?;
        self.options(options)?;

        let graded = options.iter().any(|option| option.mark.is_some());
        if !graded {
            let hint = match question.kind() {
                QuestionKind::SingleChoice => "Pick one option by its number.",
                QuestionKind::MultiChoice => "Pick one or more options by number, e.g. 1 3.",
                QuestionKind::FreeText => "Type your answer.",
            };
            writeln!(self.out, "{}", hint)?;
        }
        self.out.flush()
    }

    fn display_result(&mut self, is_correct: bool, last_question: bool) -> io::Result<()> {
        self.verdict(is_correct)?;
        if last_question {
            writeln!(
                self.out,
                "Press Enter to finish the quiz, or /summaries to finish and view your results."
            )?;
        } else {
            writeln!(self.out, "Press Enter for the next question.")?;
        }
        self.out.flush()
    }

    fn display_complete(&mut self, score: usize, total: usize, record: &RecordId) -> io::Result<()> {
        writeln!(self.out, "Quiz finished! You got {}/{} correct.", score, total)?;
        writeln!(self.out, "Your answers were saved as {}.", record.label())?;
        self.out.flush()
    }

    fn display_summary_entry(
        &mut self,
        entry: &ResultEntry,
        index: usize,
        total: usize,
    ) -> io::Result<()> {
        writeln!(self.out, "({}/{}) {}", index + 1, total, entry.question_text)?;
        match entry.typed_answer() {
            Some(answer) => {
                writeln!(self.out, "  Your answer: {}", answer)?;
                writeln!(self.out, "  Accepted answer: {}", entry.expected_answers.join(", "))?;
            }
            None => self.options(&entry.option_views())?,
        }
        self.verdict(entry.is_correct)?;
        writeln!(self.out, "n = next, b = back, /cancel = close")?;
        self.out.flush()
    }
}
