use serde::{Deserialize, Serialize};

use super::{Question, QuestionKind};

/// What the user handed in for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Submission {
    Choices(Vec<String>),
    Text { value: String, touched: bool },
}

impl Submission {
    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Submission::Choices(choices.into_iter().map(Into::into).collect())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Submission::Text {
            value: value.into(),
            touched: true,
        }
    }

    /// The normalised answer set, or `None` when the submission may not be graded yet.
    ///
    /// Choices come back in option order without duplicates and must all be options
    /// of `question`; single-choice questions take exactly one. Text must be touched
    /// and non-blank, and is trimmed.
    pub fn given_answers(&self, question: &Question) -> Option<Vec<String>> {
        match (self, question.kind()) {
            (Submission::Choices(choices), kind) if kind.is_choice() => {
                if choices.is_empty()
                    || choices
                        .iter()
                        .any(|choice| !question.options().contains(choice))
                {
                    return None;
                }
                let given: Vec<String> = question
                    .options()
                    .iter()
                    .filter(|option| choices.contains(option))
                    .cloned()
                    .collect();
                if kind == QuestionKind::SingleChoice && given.len() != 1 {
                    return None;
                }
                Some(given)
            }
            (Submission::Text { value, touched }, QuestionKind::FreeText) => {
                let value = value.trim();
                (*touched && !value.is_empty()).then(|| vec![value.to_owned()])
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GradeResult {
    pub is_correct: bool,
    pub correct_subset: Vec<String>,
    pub incorrect_subset: Vec<String>,
    /// Correct options left unpicked that would not have passed on their own.
    /// Only used to colour options, never for pass/fail.
    pub partial_subset: Vec<String>,
}

pub fn grade(question: &Question, given_answers: &[String]) -> GradeResult {
    let mut result = GradeResult::default();

    for answer in given_answers {
        if result.correct_subset.contains(answer) || result.incorrect_subset.contains(answer) {
            continue;
        }
        if question.is_correct_answer(answer) {
            result.correct_subset.push(answer.clone());
        } else {
            result.incorrect_subset.push(answer.clone());
        }
    }

    let policy = question.policy();
    let required = question.correct_answers().len();
    result.is_correct = result.incorrect_subset.is_empty()
        && policy.is_satisfied(result.correct_subset.len(), required);

    if question.kind().is_choice() && !policy.is_satisfied(1, required) {
        result.partial_subset = question
            .options()
            .iter()
            .filter(|option| question.is_correct_answer(option) && !given_answers.contains(option))
            .cloned()
            .collect();
    }

    result
}
