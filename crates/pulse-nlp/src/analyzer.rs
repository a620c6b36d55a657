//! BosonNLP HTTP client.
//!
//! Both endpoints take a JSON body and the credential in the `X-Token` header:
//!
//! ```text
//! POST /sentiment/analysis          ["text"]  -> [[positive, negative]]
//! POST /keywords/analysis?top_k=3   "text"    -> [[weight, "word"], ...]
//! ```

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::NlpError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub positive: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub word: String,
    pub weight: f64,
}

/// Sentiment and keyword extraction, authenticated per call.
pub trait TextAnalyzer {
    fn sentiment(
        &self,
        token: &str,
        text: &str,
    ) -> impl Future<Output = Result<Sentiment, NlpError>> + Send;

    fn keywords(
        &self,
        token: &str,
        text: &str,
        top_k: usize,
    ) -> impl Future<Output = Result<Vec<Keyword>, NlpError>> + Send;
}

pub struct BosonNlpClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct KeywordPair(f64, String);

impl BosonNlpClient {
    /// # Errors
    ///
    /// Returns [`NlpError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, NlpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn post<B, T>(&self, endpoint: &str, token: &str, body: &B) -> Result<T, NlpError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{endpoint}", self.base_url))
            .header("X-Token", token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &text, endpoint));
        }
        serde_json::from_str(&text).map_err(|e| NlpError::Deserialize {
            context: endpoint.to_owned(),
            source: e,
        })
    }
}

/// 429, or 403 with a quota message, means the credential is spent for now.
fn status_error(status: StatusCode, body: &str, endpoint: &str) -> NlpError {
    let quota = status == StatusCode::FORBIDDEN && {
        let body = body.to_ascii_lowercase();
        body.contains("limit") || body.contains("quota")
    };
    if status == StatusCode::TOO_MANY_REQUESTS || quota {
        NlpError::RateLimited {
            status: status.as_u16(),
        }
    } else {
        NlpError::UnexpectedStatus {
            status: status.as_u16(),
            endpoint: endpoint.to_owned(),
        }
    }
}

impl TextAnalyzer for BosonNlpClient {
    async fn sentiment(&self, token: &str, text: &str) -> Result<Sentiment, NlpError> {
        let scores: Vec<(f64, f64)> = self.post("/sentiment/analysis", token, &[text]).await?;
        let (positive, negative) = scores.first().copied().unwrap_or_default();
        Ok(Sentiment { positive, negative })
    }

    async fn keywords(&self, token: &str, text: &str, top_k: usize) -> Result<Vec<Keyword>, NlpError> {
        let endpoint = format!("/keywords/analysis?top_k={top_k}");
        let pairs: Vec<KeywordPair> = self.post(&endpoint, token, text).await?;
        Ok(pairs
            .into_iter()
            .map(|KeywordPair(weight, word)| Keyword { word, weight })
            .collect())
    }
}
