//! HTTP client for the generative-QA answer server
//!
//! [`AnswerClient`] submits a question as a JSON POST to the server's
//! `/generative_ai` endpoint and hands the streaming response body to
//! [`AnswerStream`] for incremental parsing. A non-2xx status fails the
//! request before any fragment is emitted.

use std::time::Duration;

use serde::Serialize;

use crate::config::ServerConfig;
use crate::error::{RagChatError, Result};

pub mod stream;
pub use stream::AnswerStream;

/// Path of the question-answering endpoint on the answer server.
const ANSWER_PATH: &str = "/generative_ai";

/// Request body for the answer endpoint.
#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

/// Client for the answer server
///
/// One instance is shared across all exchanges of a run; each call to
/// [`ask`](Self::ask) issues a single request and returns the stream of
/// answer fragments for it.
///
/// # Examples
///
/// ```no_run
/// use ragchat::client::AnswerClient;
/// use ragchat::config::ServerConfig;
///
/// # async fn example() -> ragchat::error::Result<()> {
/// let client = AnswerClient::new(&ServerConfig::default())?;
/// let mut stream = client.ask("What is retrieval-augmented generation?").await?;
/// while let Some(fragment) = stream.next_fragment().await? {
///     print!("{}", fragment);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AnswerClient {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl AnswerClient {
    /// Create a new answer client from server configuration
    ///
    /// # Errors
    ///
    /// Returns `RagChatError::Config` if the base URL does not parse, or
    /// `RagChatError::Transport` if HTTP client construction fails.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("ragchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                RagChatError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        let base = url::Url::parse(&config.base_url)
            .map_err(|e| RagChatError::Config(format!("Invalid server base URL: {}", e)))?;
        let endpoint = base
            .join(ANSWER_PATH)
            .map_err(|e| RagChatError::Config(format!("Invalid endpoint URL: {}", e)))?;

        tracing::info!("Initialized answer client: endpoint={}", endpoint);

        Ok(Self { client, endpoint })
    }

    /// The resolved endpoint URL this client posts questions to.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Submit a question and open the answer stream
    ///
    /// # Arguments
    ///
    /// * `question` - The question text, sent as `{"question": ...}`
    ///
    /// # Errors
    ///
    /// Returns `RagChatError::Transport` if the request cannot be sent or
    /// the server answers with a non-2xx status. No fragments are emitted
    /// in either case.
    pub async fn ask(&self, question: &str) -> Result<AnswerStream> {
        tracing::debug!("Submitting question ({} chars)", question.chars().count());

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Answer request failed: {}", e);
                RagChatError::Transport(format!("Answer request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Answer server returned {}: {}", status, error_text);
            return Err(
                RagChatError::Transport(format!("Answer server returned {}", status)).into(),
            );
        }

        Ok(AnswerStream::new(response.bytes_stream()))
    }
}
