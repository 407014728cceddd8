use crate::cli_adapter::{self, InputCommand};
use crate::client::{AnswerService, ChatAnswer, RequestFailed};
use crate::config::Config;
use crate::controller::ChatWidget;
use crate::reveal::RevealStatus;
use crate::types::Transcript;
use crate::view::TerminalView;
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

type RequestResult = Result<ChatAnswer, RequestFailed>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Coordinator<S, W: Write> {
    widget: ChatWidget,
    service: Arc<S>,
    view: TerminalView<W>,
    input_rx: mpsc::UnboundedReceiver<String>,
    interval: Duration,
    start_delay: Duration,
    raw_questions: bool,
}

impl<S, W> Coordinator<S, W>
where
    S: AnswerService + 'static,
    W: Write,
{
    pub fn new(
        config: &Config,
        service: Arc<S>,
        view: TerminalView<W>,
        input_rx: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            widget: ChatWidget::new(config.messages.clone()),
            service,
            view,
            input_rx,
            interval: Duration::from_millis(config.reveal.interval_ms),
            start_delay: Duration::from_millis(config.reveal.start_delay_ms),
            raw_questions: false,
        }
    }

    /// Treats every input line as a question, with no `/` commands.
    pub fn with_raw_questions(mut self) -> Self {
        self.raw_questions = true;
        self
    }

    /// Runs until `/quit`, or until input closes and the outstanding cycle
    /// has finished. Returns the final transcript.
    pub async fn run(mut self) -> Result<Transcript> {
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<RequestResult>();
        let mut input_open = true;
        let mut next_tick = Instant::now();

        loop {
            if !input_open && !self.widget.is_outstanding() {
                break;
            }

            tokio::select! {
                maybe_line = self.input_rx.recv(), if input_open => {
                    let line = match maybe_line {
                        Some(line) => line,
                        None => {
                            input_open = false;
                            continue;
                        }
                    };
                    if self.handle_line(&line, &result_tx)? == Flow::Quit {
                        break;
                    }
                }
                Some(result) = result_rx.recv() => {
                    self.handle_result(result)?;
                    next_tick = Instant::now() + self.start_delay;
                }
                () = time::sleep_until(next_tick), if self.widget.is_revealing() => {
                    self.handle_tick()?;
                    next_tick += self.interval;
                }
            }
        }

        Ok(self.widget.into_transcript())
    }

    fn handle_line(
        &mut self,
        line: &str,
        result_tx: &mpsc::UnboundedSender<RequestResult>,
    ) -> Result<Flow> {
        let parsed = if self.raw_questions {
            Ok(InputCommand::Ask(line.to_string()))
        } else {
            cli_adapter::parse_input(line)
        };
        let command = match parsed {
            Ok(command) => command,
            Err(err) => {
                self.view.notice(&err.to_string())?;
                self.prompt_if_idle()?;
                return Ok(Flow::Continue);
            }
        };

        let text = match command {
            InputCommand::Quit => return Ok(Flow::Quit),
            InputCommand::Help => {
                self.view.plain(cli_adapter::help_text())?;
                self.prompt_if_idle()?;
                return Ok(Flow::Continue);
            }
            InputCommand::Ask(text) => text,
            InputCommand::Suggestion(index) => match self.view.suggestions().get(index).cloned() {
                Some(text) => text,
                None => {
                    self.view.notice(&format!("no suggestion /{}", index + 1))?;
                    self.prompt_if_idle()?;
                    return Ok(Flow::Continue);
                }
            },
        };

        if self.widget.is_outstanding() {
            tracing::debug!("input ignored while a cycle is outstanding");
            self.view.notice("still answering, message ignored")?;
            return Ok(Flow::Continue);
        }

        self.widget.set_input(text);
        let Some(question) = self.widget.submit()? else {
            self.view.prompt()?;
            return Ok(Flow::Continue);
        };

        self.view.user_message(&question)?;
        self.view.waiting()?;
        self.dispatch(question, result_tx.clone());
        Ok(Flow::Continue)
    }

    fn dispatch(&self, question: String, result_tx: mpsc::UnboundedSender<RequestResult>) {
        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            tracing::debug!(question = %question, "dispatching request");
            let result = service.ask(&question).await;
            if result_tx.send(result).is_err() {
                tracing::debug!("chat closed before the answer arrived");
            }
        });
    }

    fn handle_result(&mut self, result: RequestResult) -> Result<()> {
        match result {
            Ok(answer) => {
                tracing::debug!(messages = self.widget.transcript().len(), "answer received");
                if self.widget.receive_answer(answer)? == RevealStatus::Finished {
                    self.render_finished()?;
                }
            }
            Err(err) => {
                self.widget.fail_request(&err)?;
                if let Some(last) = self.widget.transcript().last() {
                    self.view.message(last)?;
                }
                self.view.prompt()?;
            }
        }
        Ok(())
    }

    fn handle_tick(&mut self) -> Result<()> {
        match self.widget.tick()? {
            RevealStatus::Running => {
                if let Some(last) = self.widget.transcript().last() {
                    self.view.reveal_update(&last.text)?;
                }
            }
            RevealStatus::Finished => self.render_finished()?,
        }
        Ok(())
    }

    fn render_finished(&mut self) -> Result<()> {
        if let Some(last) = self.widget.transcript().last() {
            self.view.reveal_finished(&last.text)?;
        }
        self.view.prompt()
    }

    fn prompt_if_idle(&mut self) -> Result<()> {
        if self.widget.is_outstanding() {
            return Ok(());
        }
        self.view.prompt()
    }
}
