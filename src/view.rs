use crate::config::UiConfig;
use crate::types::{Message, Role};
use anyhow::{Context, Result};
use std::io::Write;

const CLEAR_LINE: &str = "\r\x1b[2K";

pub struct TerminalView<W: Write> {
    out: W,
    ui: UiConfig,
    echo_user: bool,
    indicator: bool,
    shown: Option<String>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, ui: UiConfig) -> Self {
        Self {
            out,
            ui,
            echo_user: false,
            indicator: false,
            shown: None,
        }
    }

    /// Prints user messages too, for when input did not come from the terminal.
    pub fn with_user_echo(mut self) -> Self {
        self.echo_user = true;
        self
    }

    pub fn suggestions(&self) -> &[String] {
        &self.ui.suggestions
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn welcome(&mut self) -> Result<()> {
        writeln!(self.out, "Welcome! Ask me anything and I'll help you out.")?;
        for (i, suggestion) in self.ui.suggestions.iter().enumerate() {
            writeln!(self.out, "  /{}  {suggestion}", i + 1)?;
        }
        self.flush()
    }

    pub fn prompt(&mut self) -> Result<()> {
        if self.echo_user {
            return Ok(());
        }
        write!(self.out, "> ")?;
        self.flush()
    }

    pub fn user_message(&mut self, text: &str) -> Result<()> {
        if self.echo_user {
            writeln!(self.out, "you: {text}")?;
        }
        self.flush()
    }

    pub fn waiting(&mut self) -> Result<()> {
        write!(self.out, "{} is typing...", self.ui.assistant_name)?;
        self.indicator = true;
        self.flush()
    }

    pub fn reveal_update(&mut self, text: &str) -> Result<()> {
        self.clear_indicator()?;
        let display = display_text(text);
        match self.shown.as_deref() {
            None => write!(self.out, "{}: {display}", self.ui.assistant_name)?,
            Some(shown) => match display.strip_prefix(shown) {
                Some(rest) => write!(self.out, "{rest}")?,
                None => write!(self.out, "\n{}: {display}", self.ui.assistant_name)?,
            },
        }
        self.shown = Some(display);
        self.flush()
    }

    pub fn reveal_finished(&mut self, text: &str) -> Result<()> {
        self.reveal_update(text)?;
        writeln!(self.out)?;
        self.shown = None;
        self.flush()
    }

    pub fn bot_message(&mut self, text: &str) -> Result<()> {
        self.clear_indicator()?;
        writeln!(self.out, "{}: {}", self.ui.assistant_name, display_text(text))?;
        self.flush()
    }

    /// Prints a complete message according to its role.
    pub fn message(&mut self, message: &Message) -> Result<()> {
        match message.role {
            Role::User => self.user_message(&message.text),
            Role::Bot => self.bot_message(&message.text),
        }
    }

    /// Prints a notice on its own line. An open indicator is redrawn after
    /// it; an open reveal line is closed and restarts with its prefix.
    pub fn notice(&mut self, text: &str) -> Result<()> {
        let indicator = self.indicator;
        self.clear_indicator()?;
        if self.shown.take().is_some() {
            writeln!(self.out)?;
        }
        writeln!(self.out, "({text})")?;
        if indicator {
            return self.waiting();
        }
        self.flush()
    }

    pub fn plain(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        self.flush()
    }

    fn clear_indicator(&mut self) -> Result<()> {
        if self.indicator {
            write!(self.out, "{CLEAR_LINE}")?;
            self.indicator = false;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().context("failed to flush terminal output")
    }
}

/// Converts answer markup to terminal text.
///
/// Complete tags are dropped, a tag still being revealed at the end is
/// hidden, and basic entities are decoded. A `<` not followed by a tag name
/// is kept as text.
pub fn display_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let is_tag = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        if !is_tag {
            out.push('<');
            rest = &tail[1..];
            continue;
        }
        match tail.find('>') {
            Some(end) => rest = &tail[end + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    decode_entities(&out)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
