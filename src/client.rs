use crate::config::BackendConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Any failure to obtain an answer: transport, timeout, non-2xx status or a
/// body that is not JSON.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("chat request failed: {0}")]
pub struct RequestFailed(pub String);

impl From<reqwest::Error> for RequestFailed {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ChatAnswer {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub matched_question: Option<String>,
}

impl ChatAnswer {
    #[cfg(test)]
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            matched_question: None,
        }
    }
}

#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, question: &str) -> Result<ChatAnswer, RequestFailed>;
}

#[derive(Clone)]
pub struct HttpAnswerService {
    http: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpAnswerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAnswerService")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpAnswerService {
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat", cfg.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn ask(&self, question: &str) -> Result<ChatAnswer, RequestFailed> {
        tracing::debug!(endpoint = %self.endpoint, "posting question");
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest { question })
            .send()
            .await?
            .error_for_status()?;

        let body = resp.bytes().await?;
        let answer: ChatAnswer = serde_json::from_slice(&body)
            .map_err(|err| RequestFailed(format!("invalid response body: {err}")))?;

        if let Some(matched) = &answer.matched_question {
            tracing::debug!(matched_question = %matched, "backend matched question");
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn service(base_url: String) -> HttpAnswerService {
        HttpAnswerService::new(&BackendConfig {
            base_url,
            timeout_secs: Some(5),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_base_url() {
        let svc = service("http://127.0.0.1:5000/".to_string());
        assert_eq!(svc.endpoint(), "http://127.0.0.1:5000/chat");
    }

    #[tokio::test]
    async fn posts_question_and_reads_answer() {
        let app = Router::new().route(
            "/chat",
            post(|Json(body): Json<Value>| async move {
                let question = body["question"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "matched_question": question,
                    "answer": format!("you said {question}"),
                }))
            }),
        );
        let svc = service(serve(app).await);

        let answer = svc.ask("Hello").await.unwrap();
        assert_eq!(answer.answer.as_deref(), Some("you said Hello"));
        assert_eq!(answer.matched_question.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn missing_answer_field_is_not_an_error() {
        let app = Router::new().route("/chat", post(|| async { Json(json!({ "other": 1 })) }));
        let svc = service(serve(app).await);

        let answer = svc.ask("Hello").await.unwrap();
        assert_eq!(answer, ChatAnswer::default());
    }

    #[tokio::test]
    async fn non_success_status_fails() {
        let app = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let svc = service(serve(app).await);

        assert!(svc.ask("Hello").await.is_err());
    }

    #[tokio::test]
    async fn non_json_body_fails() {
        let app = Router::new().route("/chat", post(|| async { "plain text" }));
        let svc = service(serve(app).await);

        let err = svc.ask("Hello").await.unwrap_err();
        assert!(err.0.contains("invalid response body"));
    }

    #[tokio::test]
    async fn connection_refused_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let svc = service(format!("http://{addr}"));

        assert!(svc.ask("Hello").await.is_err());
    }
}
