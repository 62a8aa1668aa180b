use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::{AnswerPolicy, Question, QuestionKind};
use crate::error::{QuizError, Result};

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// Prefix on a free-text literal that makes it compare case-sensitively.
const CASE_SENSITIVE_MARKER: char = '_';

/// A question as written in a catalog file, with correct answers given by option index.
#[derive(Debug, Deserialize)]
struct AuthoredQuestion {
    text: String,
    kind: QuestionKind,
    policy: AnswerPolicy,
    options: Vec<String>,
    correct: Vec<usize>,
}

/// The read-only catalog every session draws from.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Arc<Question>>,
}

impl QuestionBank {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let authored: Vec<AuthoredQuestion> = serde_json::from_str(raw)
            .map_err(|e| QuizError::InvalidCatalog(e.to_string()))?;

        let questions = authored
            .into_iter()
            .enumerate()
            .map(|(id, entry)| resolve(id, entry).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        log::info!("There are currently {} questions", questions.len());
        Ok(Self { questions })
    }

    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    pub fn get(&self, id: usize) -> Option<&Arc<Question>> {
        self.questions.get(id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn resolve(id: usize, entry: AuthoredQuestion) -> Result<Question> {
    let invalid = |reason: String| QuizError::InvalidCatalog(format!("question #{id}: {reason}"));

    if entry.text.trim().is_empty() {
        return Err(invalid("empty question text".into()));
    }

    if entry.kind == QuestionKind::FreeText {
        let [literal] = entry.options.as_slice() else {
            return Err(invalid("free-text questions take exactly one accepted literal".into()));
        };
        let (literal, case_sensitive) = match literal.strip_prefix(CASE_SENSITIVE_MARKER) {
            Some(stripped) => (stripped.to_owned(), true),
            None => (literal.clone(), false),
        };
        if literal.is_empty() {
            return Err(invalid("empty accepted literal".into()));
        }
        if !entry.policy.is_satisfied(1, 1) {
            return Err(invalid(format!(
                "policy {:?} can never pass a single typed answer",
                entry.policy
            )));
        }
        return Ok(Question::new(
            id,
            entry.text,
            entry.kind,
            entry.policy,
            vec![literal.clone()],
            vec![literal],
            case_sensitive,
        ));
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = entry.options.iter().find(|option| !seen.insert(option.as_str())) {
        return Err(invalid(format!("duplicate option {duplicate:?}")));
    }
    if entry.correct.is_empty() {
        return Err(invalid("no correct answers".into()));
    }

    let mut correct_answers: Vec<String> = Vec::with_capacity(entry.correct.len());
    for index in entry.correct {
        let option = entry
            .options
            .get(index)
            .ok_or_else(|| invalid(format!("correct index {index} is out of range")))?;
        if !correct_answers.contains(option) {
            correct_answers.push(option.clone());
        }
    }

    // Single-choice submissions hold exactly one option.
    let required = correct_answers.len();
    let most_correct_picks = match entry.kind {
        QuestionKind::SingleChoice => 1,
        _ => required,
    };
    if !entry.policy.is_satisfied(most_correct_picks, required) {
        return Err(invalid(format!(
            "policy {:?} can never be satisfied by a {:?} question with {} correct answer(s)",
            entry.policy, entry.kind, required
        )));
    }

    Ok(Question::new(
        id,
        entry.text,
        entry.kind,
        entry.policy,
        entry.options,
        correct_answers,
        false,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads_with_sequential_ids() {
        let bank = QuestionBank::builtin().unwrap();
        assert!(bank.len() >= 30);
        for (index, question) in bank.questions().iter().enumerate() {
            assert_eq!(question.id(), index);
        }
    }

    #[test]
    fn builtin_catalog_keeps_correct_answers_within_options() {
        let bank = QuestionBank::builtin().unwrap();
        for question in bank.questions() {
            for answer in question.correct_answers() {
                assert!(question.options().contains(answer), "{question}");
            }
        }
    }

    #[test]
    fn indices_resolve_to_literal_text() {
        let bank = QuestionBank::from_json(
            r#"[{"text": "What is the correct answer to this question?", "kind": "multi",
                 "policy": "all_required", "options": ["Yes", "No", "Germany", "WWII"],
                 "correct": [0, 3]}]"#,
        )
        .unwrap();
        let question = bank.get(0).unwrap();
        assert_eq!(question.kind(), QuestionKind::MultiChoice);
        assert_eq!(question.correct_answers(), ["Yes", "WWII"]);
    }

    #[test]
    fn marker_becomes_case_sensitive_flag() {
        let bank = QuestionBank::from_json(
            r#"[{"text": "Spell it", "kind": "free_text", "policy": "all_required",
                 "options": ["_NaCl"], "correct": [0]},
                {"text": "How many of you are there?", "kind": "free_text",
                 "policy": "all_required", "options": ["1"], "correct": [0]}]"#,
        )
        .unwrap();

        let strict = bank.get(0).unwrap();
        assert!(strict.case_sensitive());
        assert_eq!(strict.correct_answers(), ["NaCl"]);

        assert!(!bank.get(1).unwrap().case_sensitive());
    }

    #[test]
    fn duplicate_options_are_rejected() {
        let result = QuestionBank::from_json(
            r#"[{"text": "Pick", "kind": "single", "policy": "any_one",
                 "options": ["A", "A"], "correct": [0]}]"#,
        );
        assert!(matches!(result, Err(QuizError::InvalidCatalog(_))));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let result = QuestionBank::from_json(
            r#"[{"text": "Pick", "kind": "single", "policy": "any_one",
                 "options": ["A", "B"], "correct": [2]}]"#,
        );
        assert!(matches!(result, Err(QuizError::InvalidCatalog(_))));
    }

    #[test]
    fn unanswerable_policies_are_rejected() {
        for entry in [
            r#"{"text": "Pick", "kind": "single", "policy": "more_than_one",
                "options": ["A", "B"], "correct": [0, 1]}"#,
            r#"{"text": "Pick", "kind": "single", "policy": "all_required",
                "options": ["A", "B", "C"], "correct": [0, 2]}"#,
            r#"{"text": "Pick", "kind": "multi", "policy": "more_than_one",
                "options": ["A", "B"], "correct": [1]}"#,
            r#"{"text": "Type", "kind": "free_text", "policy": "more_than_one",
                "options": ["A"], "correct": [0]}"#,
        ] {
            let result = QuestionBank::from_json(&format!("[{entry}]"));
            assert!(matches!(result, Err(QuizError::InvalidCatalog(_))), "{entry}");
        }
    }

    #[test]
    fn answerable_policies_are_accepted() {
        let bank = QuestionBank::from_json(
            r#"[{"text": "Pick", "kind": "single", "policy": "any_one",
                 "options": ["A", "B", "C"], "correct": [0, 2]},
                {"text": "Pick", "kind": "single", "policy": "all_required",
                 "options": ["A", "B"], "correct": [1]},
                {"text": "Pick", "kind": "multi", "policy": "more_than_one",
                 "options": ["A", "B", "C"], "correct": [0, 1]}]"#,
        )
        .unwrap();
        assert_eq!(bank.len(), 3);
    }
}
