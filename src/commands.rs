use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Play,
    Summaries,
    Cancel,
    Quit,
}

impl Command {
    const ALL: [Command; 5] = [
        Command::Help,
        Command::Play,
        Command::Summaries,
        Command::Cancel,
        Command::Quit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Play => "play",
            Command::Summaries => "summaries",
            Command::Cancel => "cancel",
            Command::Quit => "quit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::Help => "display help.",
            Command::Play => "play the quiz",
            Command::Summaries => "browse your saved answers",
            Command::Cancel => "leave the current screen (abandons a running quiz)",
            Command::Quit => "exit the program",
        }
    }

    pub fn descriptions() -> String {
        Command::ALL
            .iter()
            .map(|command| format!("/{} - {}", command.name(), command.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `None` when the line is not a command at all.
    pub fn parse(line: &str) -> Option<Result<Command, String>> {
        line.trim().strip_prefix('/').map(str::parse)
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim().to_lowercase();
        Command::ALL
            .into_iter()
            .find(|command| command.name() == name)
            .ok_or_else(|| format!("Unknown command /{name}. Enter /help to see usages."))
    }
}
