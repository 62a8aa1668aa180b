use std::sync::Arc;

use tracing::instrument;

use crate::error::{QuizError, Result};
use crate::history::SummaryPager;
use crate::quiz::grading::{grade, GradeResult, Submission};
use crate::quiz::selector::QuestionSelector;
use crate::quiz::Question;
use crate::render::{Progress, Renderer};
use crate::results::OptionView;
use crate::state::{QuizSession, SessionContext, SessionState};
use crate::storage::record::{validate_username, RecordId, RecordSummary, ResultStore};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { questions: usize },
    /// A session is already running; the call was ignored.
    AlreadyRunning,
    NoQuestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing has been graded yet; the call was ignored.
    Ignored,
    Next(Progress),
    Complete {
        record: RecordId,
        score: usize,
        total: usize,
    },
}

/// Runs one quiz attempt at a time and is the only thing the front end talks to.
pub struct SessionController<S, R> {
    context: SessionContext,
    store: ResultStore<S>,
    renderer: R,
    state: SessionState,
}

impl<S: Storage, R: Renderer> SessionController<S, R> {
    pub fn new(context: SessionContext, store: ResultStore<S>, renderer: R) -> Self {
        Self {
            context,
            store,
            renderer,
            state: SessionState::Idle,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn store(&self) -> &ResultStore<S> {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_question(&self) -> Option<&Arc<Question>> {
        self.state.session()?.selector.current()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.state
            .session()
            .map(|session| Progress::of(&session.selector))
    }

    #[instrument(level = "info", skip(self))]
    pub fn start(&mut self, username: &str) -> Result<StartOutcome> {
        if !self.state.is_idle() {
            tracing::debug!("Start ignored, a quiz is already running");
            return Ok(StartOutcome::AlreadyRunning);
        }
        let username = validate_username(username)?.to_owned();

        let mut selector = QuestionSelector::new();
        let questions = selector
            .setup(&self.context.bank, self.context.question_range.clone())
            .len();
        if questions == 0 {
            tracing::warn!("No questions available, quiz not started");
            return Ok(StartOutcome::NoQuestions);
        }

        tracing::info!(%username, questions, "Starting quiz");
        self.state = SessionState::InProgress {
            session: QuizSession::new(username.clone(), selector),
        };
        self.renderer.display_welcome(&username)?;
        Ok(StartOutcome::Started { questions })
    }

    /// Draws the current question if one is waiting for an answer.
    pub fn present(&mut self) -> Result<bool> {
        let SessionState::InProgress { session } = &self.state else {
            return Ok(false);
        };
        let Some(question) = session.selector.current() else {
            return Ok(false);
        };
        let progress = Progress::of(&session.selector);
        self.renderer
            .display_question(question, &OptionView::unmarked(question), progress)?;
        Ok(true)
    }

    pub fn can_submit(&self, submission: &Submission) -> bool {
        match &self.state {
            SessionState::InProgress { session } => session
                .selector
                .current()
                .is_some_and(|question| submission.given_answers(question).is_some()),
            _ => false,
        }
    }

    /// Grades the current question. Ineligible submissions, and any submission while
    /// no question is waiting for an answer, are ignored and return `None`.
    #[instrument(level = "debug", skip(self))]
    pub fn submit(&mut self, submission: &Submission) -> Result<Option<GradeResult>> {
        let mut session = match self.state.reset_state() {
            SessionState::InProgress { session } => session,
            other => {
                self.state = other;
                tracing::debug!("Submit ignored, no question is waiting for an answer");
                return Ok(None);
            }
        };

        let eligible = session
            .selector
            .current()
            .cloned()
            .and_then(|question| submission.given_answers(&question).map(|given| (question, given)));
        let Some((question, given)) = eligible else {
            self.state = SessionState::InProgress { session };
            tracing::debug!("Submit ignored, answer is not eligible");
            return Ok(None);
        };

        let result = grade(&question, &given);
        let views = session.log.append(&question, &result, &given).option_views();
        let progress = Progress::of(&session.selector);
        tracing::info!(
            username = %session.username,
            question = question.id(),
            correct = result.is_correct,
            "Answer graded"
        );

        self.state = SessionState::AwaitingAdvance {
            session,
            grade: result.clone(),
        };
        self.renderer.display_question(&question, &views, progress)?;
        self.renderer
            .display_result(result.is_correct, progress.is_last())?;
        Ok(Some(result))
    }

    /// Moves past a graded question. After the last one the results are written and
    /// the controller returns to idle; a failed write keeps the session so the call
    /// can be retried.
    #[instrument(level = "debug", skip(self))]
    pub async fn advance(&mut self) -> Result<Advance> {
        let (mut session, grade) = match self.state.reset_state() {
            SessionState::AwaitingAdvance { session, grade } => (session, grade),
            other => {
                self.state = other;
                return Ok(Advance::Ignored);
            }
        };

        if session.selector.advance() {
            let progress = Progress::of(&session.selector);
            self.state = SessionState::InProgress { session };
            self.present()?;
            return Ok(Advance::Next(progress));
        }

        let record = match session.log.flush(&session.username, &self.store).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "Failed to save quiz results");
                self.state = SessionState::AwaitingAdvance { session, grade };
                return Err(e);
            }
        };

        let score = session.log.score();
        let total = session.log.len();
        session.selector.reset();
        tracing::info!(username = %session.username, score, total, "Quiz complete");

        self.renderer.display_complete(score, total, &record)?;
        Ok(Advance::Complete {
            record,
            score,
            total,
        })
    }

    /// Drops the running session without saving anything.
    pub fn abandon(&mut self) -> bool {
        match self.state.reset_state() {
            SessionState::Idle => false,
            abandoned => {
                if let Some(session) = abandoned.session() {
                    tracing::info!(
                        username = %session.username,
                        answered = session.log.len(),
                        "Quiz abandoned"
                    );
                }
                true
            }
        }
    }

    pub async fn has_records(&self, username: &str) -> bool {
        self.store.has_records(username).await
    }

    pub async fn list_records(&self, username: &str) -> Result<Vec<RecordSummary>> {
        self.store.list(username).await
    }

    /// Loads a record and draws its first entry.
    pub async fn open_record(&mut self, username: &str, id: &RecordId) -> Result<SummaryPager> {
        let record = self.store.load(username, id).await?;
        let pager = SummaryPager::new(record)
            .ok_or_else(|| QuizError::corrupted(id.file_name(), "record holds no entries"))?;
        pager.show(&mut self.renderer)?;
        Ok(pager)
    }

    pub fn turn_page(&mut self, pager: &mut SummaryPager, change: isize) -> Result<()> {
        pager.turn(change);
        pager.show(&mut self.renderer)?;
        Ok(())
    }
}
