use std::fmt;

use serde::{Deserialize, Serialize};

pub mod bank;
pub mod grading;
pub mod selector;

/// How a question is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[serde(rename = "single")]
    SingleChoice,
    #[serde(rename = "multi")]
    MultiChoice,
    FreeText,
}

impl QuestionKind {
    /// Numeric code used in stored records.
    pub fn code(self) -> u8 {
        match self {
            QuestionKind::SingleChoice => 1,
            QuestionKind::MultiChoice => 2,
            QuestionKind::FreeText => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(QuestionKind::SingleChoice),
            2 => Some(QuestionKind::MultiChoice),
            3 => Some(QuestionKind::FreeText),
            _ => None,
        }
    }

    pub fn is_choice(self) -> bool {
        !matches!(self, QuestionKind::FreeText)
    }
}

/// How many of the correct answers must be picked. Independent of [`QuestionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerPolicy {
    AllRequired,
    AnyOne,
    MoreThanOne,
}

impl AnswerPolicy {
    /// Whether `matched` correct picks with no wrong picks pass, given `required` correct answers.
    pub fn is_satisfied(self, matched: usize, required: usize) -> bool {
        match self {
            AnswerPolicy::AllRequired => matched > 0 && matched == required,
            AnswerPolicy::AnyOne => matched >= 1,
            AnswerPolicy::MoreThanOne => matched > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: usize,
    text: String,
    kind: QuestionKind,
    policy: AnswerPolicy,
    options: Vec<String>,
    correct_answers: Vec<String>,
    case_sensitive: bool,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.text)
    }
}

impl Question {
    pub(crate) fn new(
        id: usize,
        text: String,
        kind: QuestionKind,
        policy: AnswerPolicy,
        options: Vec<String>,
        correct_answers: Vec<String>,
        case_sensitive: bool,
    ) -> Self {
        Self {
            id,
            text,
            kind,
            policy,
            options,
            correct_answers,
            case_sensitive,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.policy
    }

    /// For free-text questions this holds the single accepted literal.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answers(&self) -> &[String] {
        &self.correct_answers
    }

    /// Only meaningful for free-text questions.
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_correct_answer(&self, answer: &str) -> bool {
        match self.kind {
            QuestionKind::FreeText if !self.case_sensitive => self
                .correct_answers
                .iter()
                .any(|expected| expected.to_lowercase() == answer.to_lowercase()),
            _ => self.correct_answers.iter().any(|expected| expected == answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_survive_a_lookup() {
        for kind in [
            QuestionKind::SingleChoice,
            QuestionKind::MultiChoice,
            QuestionKind::FreeText,
        ] {
            assert_eq!(QuestionKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(QuestionKind::from_code(0), None);
    }

    #[test]
    fn free_text_comparison_honours_case_flag() {
        let loose = Question::new(
            0,
            "Capital of France?".into(),
            QuestionKind::FreeText,
            AnswerPolicy::AllRequired,
            vec!["Paris".into()],
            vec!["Paris".into()],
            false,
        );
        assert!(loose.is_correct_answer("paris"));

        let strict = Question {
            case_sensitive: true,
            ..loose
        };
        assert!(!strict.is_correct_answer("paris"));
        assert!(strict.is_correct_answer("Paris"));
    }

    #[test]
    fn choice_comparison_is_exact() {
        let question = Question::new(
            1,
            "Pick".into(),
            QuestionKind::SingleChoice,
            AnswerPolicy::AnyOne,
            vec!["Yes".into(), "No".into()],
            vec!["Yes".into()],
            false,
        );
        assert!(!question.is_correct_answer("yes"));
    }
}
