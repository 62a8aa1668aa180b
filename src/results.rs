use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::quiz::grading::GradeResult;
use crate::quiz::{Question, QuestionKind};
use crate::storage::record::{RecordId, ResultStore};
use crate::storage::Storage;

/// Stored shape of one entry:
/// `(question_text, question_kind, is_correct, options, given, partial, expected)`.
#[derive(Serialize, Deserialize)]
struct EntryRow(
    String,
    u8,
    bool,
    Vec<String>,
    Vec<String>,
    Vec<String>,
    Vec<String>,
);

/// One graded question. Expected and partial answers are captured at grading time
/// so a later catalog edit cannot change how an old record is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntryRow", into = "EntryRow")]
pub struct ResultEntry {
    pub question_text: String,
    pub question_kind: QuestionKind,
    pub is_correct: bool,
    pub options: Vec<String>,
    pub given_answers: Vec<String>,
    pub partial_answers: Vec<String>,
    pub expected_answers: Vec<String>,
}

impl TryFrom<EntryRow> for ResultEntry {
    type Error = String;

    fn try_from(row: EntryRow) -> std::result::Result<Self, Self::Error> {
        let EntryRow(question_text, kind, is_correct, options, given, partial, expected) = row;
        let question_kind =
            QuestionKind::from_code(kind).ok_or_else(|| format!("unknown question kind {kind}"))?;
        Ok(Self {
            question_text,
            question_kind,
            is_correct,
            options,
            given_answers: given,
            partial_answers: partial,
            expected_answers: expected,
        })
    }
}

impl From<ResultEntry> for EntryRow {
    fn from(entry: ResultEntry) -> Self {
        EntryRow(
            entry.question_text,
            entry.question_kind.code(),
            entry.is_correct,
            entry.options,
            entry.given_answers,
            entry.partial_answers,
            entry.expected_answers,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Picked and expected, or neither.
    Correct,
    /// Expected but missed.
    Partial,
    Incorrect,
}

impl OptionMark {
    fn symbol(self) -> char {
        match self {
            OptionMark::Correct => 'V',
            OptionMark::Partial => '~',
            OptionMark::Incorrect => 'X',
        }
    }
}

/// An option as the renderer should draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub text: String,
    pub selected: bool,
    /// `None` until the question has been graded.
    pub mark: Option<OptionMark>,
}

impl fmt::Display for OptionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.selected { 'x' } else { ' ' };
        match self.mark {
            Some(mark) => write!(f, "[{}] {} ({})", check, self.text, mark.symbol()),
            None => write!(f, "[{}] {}", check, self.text),
        }
    }
}

impl OptionView {
    pub fn unmarked(question: &Question) -> Vec<OptionView> {
        if !question.kind().is_choice() {
            return Vec::new();
        }
        question
            .options()
            .iter()
            .map(|option| OptionView {
                text: option.clone(),
                selected: false,
                mark: None,
            })
            .collect()
    }
}

impl ResultEntry {
    pub fn new(question: &Question, grade: &GradeResult, given_answers: &[String]) -> Self {
        Self {
            question_text: question.text().to_owned(),
            question_kind: question.kind(),
            is_correct: grade.is_correct,
            options: question.options().to_vec(),
            given_answers: given_answers.to_vec(),
            partial_answers: grade.partial_subset.clone(),
            expected_answers: question.correct_answers().to_vec(),
        }
    }

    /// Colours every option from the captured answer sets. Live grading and replayed
    /// records both go through here, so they always agree.
    pub fn option_views(&self) -> Vec<OptionView> {
        if !self.question_kind.is_choice() {
            return Vec::new();
        }
        self.options
            .iter()
            .map(|option| {
                let selected = self.given_answers.contains(option);
                let expected = self.expected_answers.contains(option);
                let mark = if self.partial_answers.contains(option) {
                    OptionMark::Partial
                } else if selected == expected {
                    OptionMark::Correct
                } else {
                    OptionMark::Incorrect
                };
                OptionView {
                    text: option.clone(),
                    selected,
                    mark: Some(mark),
                }
            })
            .collect()
    }

    /// The free-text answer that was typed, if any.
    pub fn typed_answer(&self) -> Option<&str> {
        match self.question_kind {
            QuestionKind::FreeText => self.given_answers.first().map(String::as_str),
            _ => None,
        }
    }
}

/// Entries of the running session, in the order they were graded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultLog {
    entries: Vec<ResultEntry>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        question: &Question,
        grade: &GradeResult,
        given_answers: &[String],
    ) -> &ResultEntry {
        self.entries
            .push(ResultEntry::new(question, grade, given_answers));
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn score(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_correct).count()
    }

    /// One JSON line holding the array of entry tuples.
    pub fn serialize(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }

    /// Writes the session under a fresh timestamp.
    pub async fn flush<S: Storage>(&self, username: &str, store: &ResultStore<S>) -> Result<RecordId> {
        store.save(username, self, RecordId::now()).await
    }
}
