use anyhow::{Result, anyhow, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Ask(String),
    Suggestion(usize),
    Help,
    Quit,
}

/// Parses one terminal line. Plain text (blank included) is a question;
/// lines starting with `/` are commands.
pub fn parse_input(line: &str) -> Result<InputCommand> {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Ok(InputCommand::Ask(line.to_string()));
    };

    match command.trim() {
        "quit" | "exit" | "q" => Ok(InputCommand::Quit),
        "help" | "?" => Ok(InputCommand::Help),
        other if other.chars().all(|c| c.is_ascii_digit()) && !other.is_empty() => {
            let index: usize = other
                .parse()
                .map_err(|_| anyhow!("suggestion number is too large: {other}"))?;
            if index == 0 {
                bail!("suggestions are numbered from 1");
            }
            Ok(InputCommand::Suggestion(index - 1))
        }
        other => bail!("unknown command: /{other}"),
    }
}

pub fn help_text() -> &'static str {
    "commands:\n  /<n>    ask the n-th suggestion\n  /help   show this help\n  /quit   leave the chat"
}
