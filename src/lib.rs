pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod quiz;
pub mod render;
pub mod results;
pub mod runner;
pub mod state;
pub mod storage;

pub use app::App;
pub use config::Config;
pub use error::{QuizError, Result};
pub use quiz::bank::QuestionBank;
pub use render::{Renderer, TerminalRenderer};
pub use runner::SessionController;
pub use state::SessionContext;
pub use storage::record::ResultStore;
pub use storage::{FileStorage, Storage};
