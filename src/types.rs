use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub revealing: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            revealing: false,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            revealing: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("a reveal is still in progress")]
    RevealInProgress,
    #[error("no reveal in progress")]
    NoReveal,
}

/// Append-only list of messages, oldest first.
///
/// At most one message is revealing, and only as the last entry.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn revealing(&self) -> Option<&Message> {
        self.messages.last().filter(|msg| msg.revealing)
    }

    pub fn push(&mut self, message: Message) -> Result<(), TranscriptError> {
        if self.revealing().is_some() {
            return Err(TranscriptError::RevealInProgress);
        }
        self.messages.push(Message {
            revealing: false,
            ..message
        });
        Ok(())
    }

    pub fn begin_reveal(&mut self) -> Result<(), TranscriptError> {
        if self.revealing().is_some() {
            return Err(TranscriptError::RevealInProgress);
        }
        self.messages.push(Message {
            role: Role::Bot,
            text: String::new(),
            revealing: true,
        });
        Ok(())
    }

    pub fn update_reveal(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        let last = self.revealing_mut()?;
        last.text = text.into();
        Ok(())
    }

    pub fn finish_reveal(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        let last = self.revealing_mut()?;
        last.text = text.into();
        last.revealing = false;
        Ok(())
    }

    fn revealing_mut(&mut self) -> Result<&mut Message, TranscriptError> {
        self.messages
            .last_mut()
            .filter(|msg| msg.revealing)
            .ok_or(TranscriptError::NoReveal)
    }
}
