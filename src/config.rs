use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;

use crate::error::{QuizError, Result};

const APP_FOLDER: &str = "AnF2023Quiz";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub min_questions: usize,
    /// Exclusive upper bound of the session length.
    pub max_questions: usize,
    pub welcome_delay_ms: u64,
    pub catalog_path: Option<PathBuf>,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            min_questions: 12,
            max_questions: 17,
            welcome_delay_ms: 2000,
            catalog_path: None,
            log_level: "error".into(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            data_dir: env::var("QUIZ_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            min_questions: get_env_parse("QUIZ_MIN_QUESTIONS")?.unwrap_or(defaults.min_questions),
            max_questions: get_env_parse("QUIZ_MAX_QUESTIONS")?.unwrap_or(defaults.max_questions),
            welcome_delay_ms: get_env_parse("QUIZ_WELCOME_DELAY_MS")?
                .unwrap_or(defaults.welcome_delay_ms),
            catalog_path: env::var("QUIZ_CATALOG").ok().map(PathBuf::from),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_questions == 0 {
            return Err(QuizError::Config(
                "QUIZ_MIN_QUESTIONS must be at least 1".into(),
            ));
        }
        if self.max_questions <= self.min_questions {
            return Err(QuizError::Config(format!(
                "QUIZ_MAX_QUESTIONS ({}) must be greater than QUIZ_MIN_QUESTIONS ({})",
                self.max_questions, self.min_questions
            )));
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_FOLDER)
}

fn get_env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| QuizError::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_session_length() {
        let config = Config::default();
        assert_eq!(config.min_questions, 12);
        assert_eq!(config.max_questions, 17);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_range_is_rejected() {
        let config = Config {
            min_questions: 5,
            max_questions: 5,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(QuizError::Config(_))));
    }

    #[test]
    fn zero_minimum_is_rejected() {
        let config = Config {
            min_questions: 0,
            max_questions: 3,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
