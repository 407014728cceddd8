mod cli_adapter;
mod client;
mod config;
mod controller;
mod coordinator;
mod reveal;
mod types;
mod view;

use anyhow::{Context, Result, bail};
use client::HttpAnswerService;
use config::Config;
use coordinator::Coordinator;
use futures::StreamExt;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use view::TerminalView;

#[derive(Debug, Default)]
struct CommonArgs {
    config_path: Option<PathBuf>,
    base_url: Option<String>,
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args: Vec<String> = env::args().collect();
    let _bin = args.remove(0);
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    match args[0].as_str() {
        "chat" => run_chat(&args[1..]).await,
        "ask" => run_ask(&args[1..]).await,
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run_chat(args: &[String]) -> Result<()> {
    let mut common = CommonArgs::default();
    let mut i = 0;
    while i < args.len() {
        if let Some(step) = parse_common(args, i, &mut common)? {
            i += step;
            continue;
        }
        match args[i].as_str() {
            "--help" | "-h" => {
                print_chat_usage();
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown chat argument: {other}"));
            }
        }
    }

    let config = load_config(&common)?;
    let service = Arc::new(HttpAnswerService::new(&config.backend)?);
    tracing::info!(endpoint = service.endpoint(), "starting chat");

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    if input_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    });

    let mut view = TerminalView::new(std::io::stdout(), config.ui.clone());
    view.welcome()?;
    view.prompt()?;
    Coordinator::new(&config, service, view, input_rx)
        .run()
        .await
        .context("chat session failed")?;
    Ok(())
}

async fn run_ask(args: &[String]) -> Result<()> {
    let mut common = CommonArgs::default();
    let mut question: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        if let Some(step) = parse_common(args, i, &mut common)? {
            i += step;
            continue;
        }
        match args[i].as_str() {
            "--help" | "-h" => {
                print_ask_usage();
                return Ok(());
            }
            other if other.starts_with("--") => {
                return Err(anyhow::anyhow!("unknown ask argument: {other}"));
            }
            other => {
                question = Some(match question {
                    Some(prev) => format!("{prev} {other}"),
                    None => other.to_string(),
                });
                i += 1;
            }
        }
    }

    let question = question.context("ask requires a question")?;
    if question.trim().is_empty() {
        bail!("ask requires a question");
    }
    let config = load_config(&common)?;
    let service = Arc::new(HttpAnswerService::new(&config.backend)?);

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    input_tx
        .send(question)
        .context("failed to queue question")?;
    drop(input_tx);

    let view = TerminalView::new(std::io::stdout(), config.ui.clone()).with_user_echo();
    Coordinator::new(&config, service, view, input_rx)
        .with_raw_questions()
        .run()
        .await
        .context("ask failed")?;
    Ok(())
}

/// Consumes a shared option at `args[i]`, returning how many arguments it used.
fn parse_common(args: &[String], i: usize, common: &mut CommonArgs) -> Result<Option<usize>> {
    match args[i].as_str() {
        "--config" => {
            let value = args.get(i + 1).context("--config requires a value")?;
            common.config_path = Some(PathBuf::from(value));
            Ok(Some(2))
        }
        "--base-url" => {
            let value = args.get(i + 1).context("--base-url requires a value")?;
            common.base_url = Some(value.to_string());
            Ok(Some(2))
        }
        "--interval-ms" => {
            let value = args.get(i + 1).context("--interval-ms requires a value")?;
            common.interval_ms = Some(value.parse().context("invalid --interval-ms")?);
            Ok(Some(2))
        }
        _ => Ok(None),
    }
}

fn load_config(common: &CommonArgs) -> Result<Config> {
    let mut config = Config::resolve(common.config_path.as_deref())?;
    config.apply_env(env::var(config::BASE_URL_ENV).ok());
    if let Some(url) = &common.base_url {
        config.backend.base_url = url.clone();
    }
    if let Some(ms) = common.interval_ms {
        config.reveal.interval_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

fn print_usage() {
    eprintln!("chatterm usage:\n  chatterm chat [options]\n  chatterm ask <question> [options]");
}

fn print_chat_usage() {
    eprintln!(
        "chatterm chat options:\n  --config <path>\n  --base-url <url>\n  --interval-ms <ms>"
    );
}

fn print_ask_usage() {
    eprintln!(
        "chatterm ask <question> options:\n  --config <path>\n  --base-url <url>\n  --interval-ms <ms>"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_common_reads_shared_options() {
        let argv = args(&["--base-url", "http://h:1", "--interval-ms", "20", "--config", "c.toml"]);
        let mut common = CommonArgs::default();

        let mut i = 0;
        while i < argv.len() {
            i += parse_common(&argv, i, &mut common).unwrap().unwrap();
        }

        assert_eq!(common.base_url.as_deref(), Some("http://h:1"));
        assert_eq!(common.interval_ms, Some(20));
        assert_eq!(common.config_path, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn parse_common_rejects_missing_or_bad_values() {
        let mut common = CommonArgs::default();
        assert!(parse_common(&args(&["--base-url"]), 0, &mut common).is_err());
        assert!(parse_common(&args(&["--interval-ms", "soon"]), 0, &mut common).is_err());
        assert!(parse_common(&args(&["hello"]), 0, &mut common).unwrap().is_none());
    }

    #[tokio::test]
    async fn ask_rejects_missing_or_blank_question() {
        assert!(run_ask(&[]).await.is_err());
        assert!(run_ask(&args(&["  "])).await.is_err());
    }

    #[test]
    fn flags_override_config() {
        let common = CommonArgs {
            config_path: None,
            base_url: Some("http://10.1.1.1:9000".to_string()),
            interval_ms: Some(5),
        };
        let config = load_config(&common).unwrap();
        assert_eq!(config.backend.base_url, "http://10.1.1.1:9000");
        assert_eq!(config.reveal.interval_ms, 5);
    }
}
