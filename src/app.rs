use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Instant;
use tracing::instrument;

use crate::commands::Command;
use crate::error::{QuizError, Result};
use crate::history::SummaryPager;
use crate::quiz::grading::Submission;
use crate::quiz::QuestionKind;
use crate::render::TerminalRenderer;
use crate::runner::{Advance, SessionController, StartOutcome};
use crate::storage::record::{validate_username, RecordSummary};
use crate::storage::Storage;

type Controller<S, W> = SessionController<S, TerminalRenderer<W>>;

#[derive(Debug)]
enum Screen {
    AskName,
    Menu,
    Quiz,
    Records {
        records: Vec<RecordSummary>,
    },
    Summary {
        records: Vec<RecordSummary>,
        pager: SummaryPager,
    },
}

enum Flow {
    Continue,
    Quit,
}

/// Line-driven terminal front end on top of a [`SessionController`].
pub struct App<S, W> {
    controller: Controller<S, W>,
    screen: Screen,
    username: Option<String>,
    /// When the first question of a freshly started quiz is due on screen.
    reveal_at: Option<Instant>,
}

impl<S: Storage, W: Write> App<S, W> {
    pub fn new(controller: Controller<S, W>) -> Self {
        Self {
            controller,
            screen: Screen::AskName,
            username: None,
            reveal_at: None,
        }
    }

    pub fn controller(&self) -> &Controller<S, W> {
        &self.controller
    }

    pub fn into_controller(self) -> Controller<S, W> {
        self.controller
    }

    /// Reads lines until end of input or `/quit`. Closing the input mid-quiz abandons it.
    pub async fn run<I: AsyncBufRead + Unpin>(&mut self, input: I) -> Result<()> {
        let mut lines = input.lines();
        self.say("The Almighty Quiz")?;
        self.say("Enter your username:")?;

        loop {
            // Input keeps flowing during the welcome delay, so it can be cancelled.
            let next = match self.reveal_at {
                Some(deadline) => tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => None,
                    line = lines.next_line() => Some(line),
                },
                None => Some(lines.next_line().await),
            };

            let handled = match next {
                None => self.reveal().map(|_| Flow::Continue),
                Some(line) => match line? {
                    Some(line) => self.handle(&line).await,
                    None => break,
                },
            };
            match handled {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => self.report(&e)?,
            }
        }

        self.controller.abandon();
        Ok(())
    }

    fn report(&mut self, e: &QuizError) -> Result<()> {
        tracing::error!(error = %e, "Failed to handle input");
        self.say(format!("Error: {e}"))
    }

    /// Shows the first question once the welcome has been on screen long enough.
    fn reveal(&mut self) -> Result<()> {
        self.reveal_at = None;
        self.controller.present()?;
        Ok(())
    }

    /// Where to land when a handler fails part-way, based on what the controller holds.
    fn fallback_screen(&self) -> Screen {
        if !self.controller.state().is_idle() {
            Screen::Quiz
        } else if self.username.is_none() {
            Screen::AskName
        } else {
            Screen::Menu
        }
    }

    fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        self.controller.renderer_mut().say(text)?;
        Ok(())
    }

    async fn handle(&mut self, line: &str) -> Result<Flow> {
        if let Some(command) = Command::parse(line) {
            return match command {
                Ok(command) => self.command(command).await,
                Err(message) => {
                    self.say(message)?;
                    Ok(Flow::Continue)
                }
            };
        }

        let screen = std::mem::replace(&mut self.screen, Screen::Menu);
        let next = match screen {
            Screen::AskName => self.receive_username(line).await,
            Screen::Menu => self
                .say("Enter /play to start the quiz or /help to see usages.")
                .map(|_| Screen::Menu),
            Screen::Quiz => self.receive_answer(line).await,
            Screen::Records { records } => self.select_record(records, line).await,
            Screen::Summary { records, pager } => self.page_summary(records, pager, line),
        };
        match next {
            Ok(screen) => {
                self.screen = screen;
                Ok(Flow::Continue)
            }
            Err(e) => {
                self.screen = self.fallback_screen();
                Err(e)
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Help => self.say(Command::descriptions())?,
            Command::Quit => {
                self.reveal_at = None;
                if self.controller.abandon() {
                    self.say("Quiz abandoned, nothing was saved.")?;
                }
                return Ok(Flow::Quit);
            }
            Command::Cancel => self.cancel().await?,
            Command::Play => self.play().await?,
            Command::Summaries => self.summaries().await?,
        }
        Ok(Flow::Continue)
    }

    async fn cancel(&mut self) -> Result<()> {
        let screen = std::mem::replace(&mut self.screen, Screen::Menu);
        match screen {
            Screen::AskName => self.screen = Screen::AskName,
            Screen::Menu => {
                self.controller.abandon();
                self.username = None;
                self.screen = Screen::AskName;
                self.say("Enter your username:")?;
            }
            Screen::Quiz => {
                self.reveal_at = None;
                self.controller.abandon();
                self.say("Quiz abandoned, nothing was saved.")?;
                self.menu().await?;
            }
            Screen::Records { .. } => self.menu().await?,
            Screen::Summary { records, .. } => {
                self.show_records(&records)?;
                self.screen = Screen::Records { records };
            }
        }
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        let Some(username) = self.username.clone() else {
            return self.say("Enter your username first.");
        };
        if matches!(self.screen, Screen::Records { .. } | Screen::Summary { .. }) {
            return self.say("Please close the summary with /cancel to continue...");
        }

        match self.controller.start(&username)? {
            StartOutcome::Started { questions } => {
                tracing::info!(%username, questions, "Loading the quiz");
                self.screen = Screen::Quiz;
                let delay = self.controller.context().welcome_delay;
                if delay.is_zero() {
                    self.reveal()?;
                } else {
                    self.reveal_at = Some(Instant::now() + delay);
                }
            }
            StartOutcome::AlreadyRunning => self.say("A quiz is already running.")?,
            StartOutcome::NoQuestions => {
                self.say("Sorry, no questions are available.")?;
            }
        }
        Ok(())
    }

    async fn summaries(&mut self) -> Result<()> {
        let Some(username) = self.username.clone() else {
            return self.say("Enter your username first.");
        };

        if matches!(self.screen, Screen::Quiz) {
            if self.reveal_at.is_some() {
                return self.say("Finish the quiz or /cancel it first.");
            }
            let finishing = self.controller.state().is_awaiting_advance()
                && self.controller.progress().is_some_and(|p| p.is_last());
            if !finishing {
                return self.say("Finish the quiz or /cancel it first.");
            }
            if !matches!(self.controller.advance().await?, Advance::Complete { .. }) {
                return Ok(());
            }
        }

        let records = self.controller.list_records(&username).await?;
        if records.is_empty() {
            self.say("You have no saved answers yet.")?;
            return self.menu().await;
        }
        self.show_records(&records)?;
        self.screen = Screen::Records { records };
        Ok(())
    }

    async fn menu(&mut self) -> Result<()> {
        self.screen = Screen::Menu;
        let Some(username) = self.username.clone() else {
            self.screen = Screen::AskName;
            return self.say("Enter your username:");
        };
        self.say(format!("Hello, {username}! Enter /play to play the quiz."))?;
        if self.controller.has_records(&username).await {
            self.say("Enter /summaries to view your saved answers.")?;
        }
        Ok(())
    }

    fn show_records(&mut self, records: &[RecordSummary]) -> Result<()> {
        let username = self.username.clone().unwrap_or_default();
        self.controller
            .renderer_mut()
            .records(&username, records)?;
        Ok(())
    }

    async fn receive_username(&mut self, line: &str) -> Result<Screen> {
        match validate_username(line) {
            Ok(username) => {
                tracing::info!(%username, "Setting username");
                self.username = Some(username.to_owned());
                self.menu().await?;
                Ok(Screen::Menu)
            }
            Err(_) => {
                self.say("That is not an acceptable username")?;
                Ok(Screen::AskName)
            }
        }
    }

    async fn receive_answer(&mut self, line: &str) -> Result<Screen> {
        if self.reveal_at.is_some() {
            // Skips the rest of the welcome; the line is not an answer.
            self.reveal()?;
            return Ok(Screen::Quiz);
        }

        if self.controller.state().is_awaiting_advance() {
            return match self.controller.advance().await {
                Ok(Advance::Complete { .. }) => {
                    self.menu().await?;
                    Ok(Screen::Menu)
                }
                Ok(Advance::Next(_) | Advance::Ignored) => Ok(Screen::Quiz),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to save quiz results, keeping the session");
                    self.say(format!(
                        "Your answers could not be saved: {e}\nPress Enter to try again or /cancel to give up."
                    ))?;
                    Ok(Screen::Quiz)
                }
            };
        }

        let Some(question) = self.controller.current_question().cloned() else {
            self.menu().await?;
            return Ok(Screen::Menu);
        };

        let submission = match question.kind() {
            QuestionKind::FreeText => Submission::text(line),
            _ => match parse_choices(line, question.options()) {
                Ok(submission) => submission,
                Err(message) => {
                    self.say(message)?;
                    return Ok(Screen::Quiz);
                }
            },
        };

        if !self.controller.can_submit(&submission) {
            let hint = match question.kind() {
                QuestionKind::SingleChoice => "Pick exactly one option.",
                QuestionKind::MultiChoice => "Pick at least one option.",
                QuestionKind::FreeText => "Type an answer first.",
            };
            self.say(hint)?;
            return Ok(Screen::Quiz);
        }

        self.controller.submit(&submission)?;
        Ok(Screen::Quiz)
    }

    async fn select_record(&mut self, records: Vec<RecordSummary>, line: &str) -> Result<Screen> {
        let picked = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| records.get(index));
        let Some(id) = picked.map(|record| record.id) else {
            self.say("Pick a record by its number.")?;
            return Ok(Screen::Records { records });
        };

        let username = self.username.clone().unwrap_or_default();
        match self.controller.open_record(&username, &id).await {
            Ok(pager) => Ok(Screen::Summary { records, pager }),
            Err(QuizError::DataCorruption { record, reason }) => {
                tracing::warn!(%record, %reason, "Skipping corrupted record");
                self.say("That record is corrupted and can't be shown.")?;
                Ok(Screen::Records { records })
            }
            Err(e) => Err(e),
        }
    }

    fn page_summary(
        &mut self,
        records: Vec<RecordSummary>,
        mut pager: SummaryPager,
        line: &str,
    ) -> Result<Screen> {
        match line.trim().to_lowercase().as_str() {
            "" | "n" | "next" => self.controller.turn_page(&mut pager, 1)?,
            "b" | "back" => self.controller.turn_page(&mut pager, -1)?,
            _ => self.say("n = next, b = back, /cancel = close")?,
        }
        Ok(Screen::Summary { records, pager })
    }
}

/// Turns `"1 3"` or `"1,3"` into the options at those 1-based positions.
fn parse_choices(line: &str, options: &[String]) -> std::result::Result<Submission, String> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .and_then(|index| options.get(index))
                .cloned()
                .ok_or_else(|| format!("There is no option {token}."))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Submission::Choices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["Pluto".into(), "Mercury".into(), "Mars".into()]
    }

    #[test]
    fn choices_are_read_by_position() {
        assert_eq!(
            parse_choices("2, 3", &options()),
            Ok(Submission::choices(["Mercury", "Mars"]))
        );
        assert_eq!(parse_choices("", &options()), Ok(Submission::Choices(vec![])));
    }

    #[test]
    fn unknown_positions_are_reported() {
        assert!(parse_choices("4", &options()).is_err());
        assert!(parse_choices("0", &options()).is_err());
        assert!(parse_choices("two", &options()).is_err());
    }
}
