use crate::types::{Transcript, TranscriptError};
use std::iter::{FusedIterator, Peekable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealStep {
    /// Words revealed so far, joined by single spaces.
    Partial(String),
    /// The exact answer text, emitted once after the last word.
    Complete(String),
}

/// Generator of reveal steps for one answer.
#[derive(Debug, Clone)]
pub struct RevealSteps {
    answer: String,
    words: Vec<String>,
    next_word: usize,
    shown: String,
    completed: bool,
}

impl RevealSteps {
    pub fn new(answer: impl Into<String>) -> Self {
        let answer = answer.into();
        let words = answer.split_whitespace().map(str::to_string).collect();
        Self {
            answer,
            words,
            next_word: 0,
            shown: String::new(),
            completed: false,
        }
    }

    #[cfg(test)]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

impl Iterator for RevealSteps {
    type Item = RevealStep;

    fn next(&mut self) -> Option<RevealStep> {
        if let Some(word) = self.words.get(self.next_word) {
            if !self.shown.is_empty() {
                self.shown.push(' ');
            }
            self.shown.push_str(word);
            self.next_word += 1;
            return Some(RevealStep::Partial(self.shown.clone()));
        }
        if self.completed {
            return None;
        }
        self.completed = true;
        Some(RevealStep::Complete(self.answer.clone()))
    }
}

impl FusedIterator for RevealSteps {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStatus {
    Running,
    Finished,
}

/// Applies [`RevealSteps`] to the trailing transcript message.
///
/// Each [`Reveal::advance`] call is one timer tick. The tick that shows the
/// last word also applies the final text and returns
/// [`RevealStatus::Finished`]; with no words at all the first call finishes
/// without any partial update.
#[derive(Debug)]
pub struct Reveal {
    steps: Peekable<RevealSteps>,
    partials: usize,
    finished: bool,
}

impl Reveal {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            steps: RevealSteps::new(answer).peekable(),
            partials: 0,
            finished: false,
        }
    }

    /// True when the reveal has no words and needs no tick.
    pub fn is_instant(&mut self) -> bool {
        matches!(self.steps.peek(), Some(RevealStep::Complete(_)))
    }

    /// Number of partial updates applied so far.
    pub fn partials(&self) -> usize {
        self.partials
    }

    pub fn advance(&mut self, transcript: &mut Transcript) -> Result<RevealStatus, TranscriptError> {
        if self.finished {
            return Ok(RevealStatus::Finished);
        }

        if let Some(RevealStep::Partial(text)) = self.steps.next_if(|step| {
            matches!(step, RevealStep::Partial(_))
        }) {
            transcript.update_reveal(text)?;
            self.partials += 1;
        }

        match self.steps.peek() {
            Some(RevealStep::Partial(_)) => Ok(RevealStatus::Running),
            _ => {
                if let Some(RevealStep::Complete(text)) = self.steps.next() {
                    transcript.finish_reveal(text)?;
                }
                self.finished = true;
                Ok(RevealStatus::Finished)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn placeholder() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("Hello")).unwrap();
        transcript.begin_reveal().unwrap();
        transcript
    }

    #[test]
    fn steps_accumulate_words_then_complete() {
        let steps: Vec<_> = RevealSteps::new("Hi there friend").collect();
        assert_eq!(
            steps,
            vec![
                RevealStep::Partial("Hi".into()),
                RevealStep::Partial("Hi there".into()),
                RevealStep::Partial("Hi there friend".into()),
                RevealStep::Complete("Hi there friend".into()),
            ]
        );
    }

    #[test]
    fn complete_keeps_original_whitespace() {
        let answer = "  line one\n\nline   two ";
        let mut steps = RevealSteps::new(answer);
        assert_eq!(steps.word_count(), 4);

        let last = steps.by_ref().last();
        assert_eq!(last, Some(RevealStep::Complete(answer.to_string())));
        assert_eq!(steps.next(), None);
    }

    #[test]
    fn empty_answer_yields_only_complete() {
        let steps: Vec<_> = RevealSteps::new("").collect();
        assert_eq!(steps, vec![RevealStep::Complete(String::new())]);
    }

    #[test]
    fn advance_mutates_once_per_word() {
        let mut transcript = placeholder();
        let mut reveal = Reveal::new("Hi there friend");
        assert!(!reveal.is_instant());

        assert_eq!(reveal.advance(&mut transcript).unwrap(), RevealStatus::Running);
        assert_eq!(transcript.revealing().map(|m| m.text.as_str()), Some("Hi"));
        assert_eq!(reveal.advance(&mut transcript).unwrap(), RevealStatus::Running);
        assert_eq!(
            transcript.revealing().map(|m| m.text.as_str()),
            Some("Hi there")
        );
        assert_eq!(reveal.advance(&mut transcript).unwrap(), RevealStatus::Finished);

        assert_eq!(reveal.partials(), 3);
        assert_eq!(transcript.last(), Some(&Message::bot("Hi there friend")));
    }

    #[test]
    fn final_text_is_exact_original() {
        let answer = "Visit\n<a href=\"https://x.io\">x</a>  today";
        let mut transcript = placeholder();
        let mut reveal = Reveal::new(answer);

        let mut ticks = 0;
        while reveal.advance(&mut transcript).unwrap() == RevealStatus::Running {
            ticks += 1;
        }

        assert_eq!(ticks + 1, reveal.partials());
        assert_eq!(transcript.last().map(|m| m.text.as_str()), Some(answer));
        assert!(transcript.revealing().is_none());
    }

    #[test]
    fn empty_answer_finishes_without_partials() {
        let mut transcript = placeholder();
        let mut reveal = Reveal::new("");
        assert!(reveal.is_instant());

        assert_eq!(reveal.advance(&mut transcript).unwrap(), RevealStatus::Finished);
        assert_eq!(reveal.partials(), 0);
        assert_eq!(transcript.last(), Some(&Message::bot("")));
    }

    #[test]
    fn advance_after_finish_is_inert() {
        let mut transcript = placeholder();
        let mut reveal = Reveal::new("done");
        assert_eq!(reveal.advance(&mut transcript).unwrap(), RevealStatus::Finished);
        transcript.push(Message::user("next")).unwrap();

        assert_eq!(reveal.advance(&mut transcript).unwrap(), RevealStatus::Finished);
        assert_eq!(transcript.last(), Some(&Message::user("next")));
    }
}
