use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::answer::{AskAnswer, resolve_answer};

/// Default OpenAI-compatible endpoint when `OPENAI_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model when `OPENAI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// System instruction sent with every question. The product serves a Chinese
/// middle-school student, so the model is told to answer in Chinese and to
/// respond strictly as four-field JSON.
const SYSTEM_PROMPT: &str = "你是一个学习辅助老师，擅长用初三学生能懂的方式讲解。\n\
你要帮助学生理解思路，而不是直接抄作业。\n\
请用中文输出，必须是严格 JSON，不要多余文字。\n\
JSON 格式固定为：{\"concept\": \"...\", \"solution\": \"...\", \"pitfalls\": \"...\", \"next\": \"...\"}\n\
要求：\n\
- concept：用通俗的话解释核心概念（不要太长）\n\
- solution：给解题/理解的步骤和思路（尽量分点）\n\
- pitfalls：列 3-5 个易错点/坑\n\
- next：给 3-5 条下一步学习建议（可以包含练习建议）\n\
最后不要输出任何额外字段。";

/// Errors when asking the upstream model provider.
#[derive(Debug, Error)]
pub enum AskError {
    /// The question was empty after trimming. Detected before any I/O.
    #[error("question must not be empty")]
    EmptyQuestion,

    /// `OPENAI_API_KEY` is not configured. Detected before any network call.
    #[error("OPENAI_API_KEY is not set; configure it in .env or the environment")]
    MissingApiKey,

    /// The configured base URL does not parse as a URL.
    #[error("invalid upstream base URL: {0}")]
    InvalidBaseUrl(String),

    /// Connection, DNS, timeout or body-decoding failures from the transport.
    #[error("network error talking to the model provider: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status from the provider, with the raw body.
    #[error("model provider returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The provider answered 2xx but with no usable message content.
    #[error("model provider returned no content")]
    NoContent,
}

/// Upstream connection settings, passed explicitly so tests can inject a
/// local mock provider instead of relying on ambient process state.
#[derive(Debug, Clone)]
pub struct AskConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl AskConfig {
    /// Reads the configuration from the environment.
    ///
    /// `OPENAI_BASE_URL` and `OPENAI_MODEL` fall back to the public defaults
    /// when unset or blank. A missing or blank `OPENAI_API_KEY` is a hard
    /// error: the ask endpoint refuses to run unauthenticated.
    pub fn from_env() -> Result<Self, AskError> {
        let api_key = env_non_blank("OPENAI_API_KEY").ok_or(AskError::MissingApiKey)?;
        let base_url =
            env_non_blank("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = env_non_blank("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }
}

fn env_non_blank(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Builds the HTTP client used for upstream calls: 60 s request timeout,
/// 5 s connect timeout, no retries.
pub fn http_client() -> Result<reqwest::Client, AskError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(AskError::Network)
}

/// Client for the chat-completions endpoint of an OpenAI-compatible provider.
pub struct AskClient {
    http: reqwest::Client,
    config: AskConfig,
}

/// Wire shape of a chat-completions response; only the fields we read.
#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl AskClient {
    /// Creates a client over an existing HTTP connection pool.
    ///
    /// Fails only if the configured base URL is not a valid URL.
    pub fn new(http: reqwest::Client, config: AskConfig) -> Result<Self, AskError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| AskError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;
        Ok(Self { http, config })
    }

    /// Sends one question to the model and returns the structured answer.
    ///
    /// Empty questions are rejected before any network traffic. Upstream
    /// failures (non-success status, empty content, transport errors) are
    /// reported as errors; content that merely fails to match the requested
    /// JSON shape degrades into an answer instead.
    pub async fn ask(&self, question: &str) -> Result<AskAnswer, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }
        let content = self.chat_completion(question).await?;
        Ok(resolve_answer(&content))
    }

    /// Performs the single chat-completions request and extracts the
    /// first choice's message content.
    async fn chat_completion(&self, question: &str) -> Result<String, AskError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let user = format!(
            "我的问题：\n{question}\n\n提醒：回答是参考信息，请结合课本和老师讲解核对。"
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": 0.4,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user },
            ],
        });

        tracing::debug!(model = %self.config.model, "sending chat completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AskError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AskError::NoContent)
    }
}
