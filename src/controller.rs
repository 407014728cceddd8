use crate::client::{ChatAnswer, RequestFailed};
use crate::config::MessagesConfig;
use crate::reveal::{Reveal, RevealStatus};
use crate::types::{Message, Transcript, TranscriptError};

#[derive(Debug)]
pub struct ChatWidget {
    transcript: Transcript,
    input: String,
    outstanding: bool,
    reveal: Option<Reveal>,
    messages: MessagesConfig,
}

impl ChatWidget {
    pub fn new(messages: MessagesConfig) -> Self {
        Self {
            transcript: Transcript::new(),
            input: String::new(),
            outstanding: false,
            reveal: None,
            messages,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    /// Replaces the input draft. Refused while a cycle is outstanding.
    pub fn set_input(&mut self, text: impl Into<String>) -> bool {
        if self.outstanding {
            return false;
        }
        self.input = text.into();
        true
    }

    /// Starts a cycle from the current draft and returns the question to send.
    ///
    /// Returns `None` without side effects when the draft is blank or a cycle
    /// is already outstanding.
    pub fn submit(&mut self) -> Result<Option<String>, TranscriptError> {
        if self.outstanding {
            return Ok(None);
        }
        let question = self.input.trim();
        if question.is_empty() {
            return Ok(None);
        }
        let question = question.to_string();

        self.transcript.push(Message::user(question.clone()))?;
        self.input.clear();
        self.outstanding = true;
        Ok(Some(question))
    }

    /// Appends the revealing placeholder and starts revealing `answer`.
    ///
    /// An answer with no words finishes immediately and closes the cycle.
    pub fn receive_answer(&mut self, answer: ChatAnswer) -> Result<RevealStatus, TranscriptError> {
        let text = answer
            .answer
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.messages.fallback_answer.clone());

        self.transcript.begin_reveal()?;
        let mut reveal = Reveal::new(text);
        if reveal.is_instant() {
            reveal.advance(&mut self.transcript)?;
            self.finish_cycle();
            return Ok(RevealStatus::Finished);
        }
        self.reveal = Some(reveal);
        Ok(RevealStatus::Running)
    }

    /// Advances the active reveal by one tick.
    pub fn tick(&mut self) -> Result<RevealStatus, TranscriptError> {
        let Some(reveal) = self.reveal.as_mut() else {
            return Ok(RevealStatus::Finished);
        };
        let status = reveal.advance(&mut self.transcript)?;
        if status == RevealStatus::Finished {
            tracing::debug!(words = reveal.partials(), "reveal finished");
            self.reveal = None;
            self.finish_cycle();
        }
        Ok(status)
    }

    pub fn fail_request(&mut self, err: &RequestFailed) -> Result<(), TranscriptError> {
        tracing::warn!(error = %err, "request cycle failed");
        self.transcript
            .push(Message::bot(self.messages.failure_notice.clone()))?;
        self.finish_cycle();
        Ok(())
    }

    fn finish_cycle(&mut self) {
        self.outstanding = false;
    }
}
