use std::ops::Range;
use std::sync::Arc;

use rand::Rng;

use super::bank::QuestionBank;
use super::Question;

/// Picks the questions of one session and tracks the position inside it.
#[derive(Debug, Clone, Default)]
pub struct QuestionSelector {
    selected: Vec<Arc<Question>>,
    cursor: usize,
}

impl QuestionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setup(&mut self, bank: &QuestionBank, range: Range<usize>) -> &[Arc<Question>] {
        self.setup_with_rng(bank, range, &mut rand::thread_rng())
    }

    /// Draws a length uniformly from `range` and samples that many questions without
    /// repetition. A bank smaller than the drawn length yields a shorter session.
    pub fn setup_with_rng<R: Rng>(
        &mut self,
        bank: &QuestionBank,
        range: Range<usize>,
        rng: &mut R,
    ) -> &[Arc<Question>] {
        let wanted = if range.is_empty() {
            range.start
        } else {
            rng.gen_range(range)
        };

        let mut remaining: Vec<Arc<Question>> = bank.questions().to_vec();
        self.selected = Vec::with_capacity(wanted.min(remaining.len()));
        self.cursor = 0;

        while self.selected.len() < wanted {
            if remaining.is_empty() {
                tracing::info!(
                    wanted,
                    obtained = self.selected.len(),
                    "Not enough questions, continuing with a shorter quiz"
                );
                break;
            }
            let pick = rng.gen_range(0..remaining.len());
            self.selected.push(remaining.swap_remove(pick));
        }

        &self.selected
    }

    pub fn current(&self) -> Option<&Arc<Question>> {
        self.selected.get(self.cursor)
    }

    /// Moves to the next question. Returns false, leaving the cursor alone, on the last one.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 >= self.selected.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn reset(&mut self) {
        self.selected.clear();
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_last(&self) -> bool {
        !self.selected.is_empty() && self.cursor + 1 == self.selected.len()
    }

    pub fn selected(&self) -> &[Arc<Question>] {
        &self.selected
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::quiz::{AnswerPolicy, QuestionKind};

    fn bank_of(size: usize) -> QuestionBank {
        QuestionBank::from_questions(
            (0..size)
                .map(|id| {
                    Question::new(
                        id,
                        format!("Question {id}"),
                        QuestionKind::SingleChoice,
                        AnswerPolicy::AnyOne,
                        vec!["A".into(), "B".into()],
                        vec!["A".into()],
                        false,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn never_repeats_a_question() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for size in [0, 1, 5, 13, 40] {
                let mut selector = QuestionSelector::new();
                let picked = selector.setup_with_rng(&bank_of(size), 12..17, &mut rng);
                let ids: HashSet<usize> = picked.iter().map(|q| q.id()).collect();
                assert_eq!(ids.len(), picked.len());
            }
        }
    }

    #[test]
    fn length_stays_within_the_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let bank = bank_of(40);
        for _ in 0..100 {
            let mut selector = QuestionSelector::new();
            let len = selector.setup_with_rng(&bank, 12..17, &mut rng).len();
            assert!((12..17).contains(&len));
        }
    }

    #[test]
    fn small_bank_degrades_to_a_shorter_session() {
        let mut selector = QuestionSelector::new();
        let picked = selector.setup_with_rng(&bank_of(3), 12..17, &mut StdRng::seed_from_u64(1));
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn advance_stops_on_the_last_question() {
        let mut selector = QuestionSelector::new();
        selector.setup_with_rng(&bank_of(2), 2..3, &mut StdRng::seed_from_u64(3));

        assert_eq!(selector.cursor(), 0);
        assert!(!selector.is_last());
        assert!(selector.advance());
        assert!(selector.is_last());
        assert!(!selector.advance());
        assert_eq!(selector.cursor(), 1);
    }

    #[test]
    fn reset_returns_to_the_unset_state() {
        let mut selector = QuestionSelector::new();
        assert!(selector.current().is_none());

        selector.setup_with_rng(&bank_of(4), 3..4, &mut StdRng::seed_from_u64(9));
        assert!(selector.current().is_some());

        selector.reset();
        assert!(selector.current().is_none());
        assert!(selector.is_empty());
        assert!(!selector.advance());
    }
}
