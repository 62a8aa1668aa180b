use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::quiz::bank::QuestionBank;
use crate::quiz::grading::GradeResult;
use crate::quiz::selector::QuestionSelector;
use crate::results::ResultLog;

/// Settings and shared data every session runs against.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub bank: Arc<QuestionBank>,
    pub question_range: Range<usize>,
    pub welcome_delay: Duration,
}

impl SessionContext {
    pub fn new(bank: Arc<QuestionBank>, config: &Config) -> Self {
        Self {
            bank,
            question_range: config.min_questions..config.max_questions,
            welcome_delay: Duration::from_millis(config.welcome_delay_ms),
        }
    }
}

/// Everything one attempt owns. Dropped as a whole when the attempt ends.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub username: String,
    pub selector: QuestionSelector,
    pub log: ResultLog,
}

impl QuizSession {
    pub fn new(username: impl Into<String>, selector: QuestionSelector) -> Self {
        Self {
            username: username.into(),
            selector,
            log: ResultLog::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    InProgress {
        session: QuizSession,
    },
    AwaitingAdvance {
        session: QuizSession,
        grade: GradeResult,
    },
}

impl SessionState {
    /// Takes the current state out, leaving a fresh idle one behind.
    pub fn reset_state(&mut self) -> SessionState {
        std::mem::take(self)
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match self {
            SessionState::Idle => None,
            SessionState::InProgress { session } | SessionState::AwaitingAdvance { session, .. } => {
                Some(session)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_awaiting_advance(&self) -> bool {
        matches!(self, SessionState::AwaitingAdvance { .. })
    }
}
