use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use pulse_core::AppConfig;

use crate::error::ScraperError;
use crate::retry::RetryPolicy;

/// Query parameters whose values never reach the logs.
const SECRET_PARAMS: [&str; 3] = ["access_token", "oauth2_access_token", "token"];

/// Something that can turn a URL into a JSON document.
///
/// Implemented by [`HttpClient`]; tests supply canned pages.
pub trait JsonSource {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, ScraperError>> + Send;
}

/// HTTP client shared by every harvester of one platform.
///
/// Transport failures (network errors, timeouts, non-2xx statuses) are retried
/// according to the configured [`RetryPolicy`].
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
    bearer: Option<String>,
}

impl HttpClient {
    /// Creates an `HttpClient` with a request timeout, `User-Agent` and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        policy: RetryPolicy,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            policy,
            bearer: None,
        })
    }

    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.http_timeout_secs,
            &config.user_agent,
            RetryPolicy::from_config(config),
        )
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    async fn get_once(&self, url: &str, label: &str) -> Result<Value, ScraperError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: label.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: label.to_owned(),
            source: e,
        })
    }
}

impl JsonSource for HttpClient {
    async fn get_json(&self, url: &str) -> Result<Value, ScraperError> {
        let label = redact_url(url);
        tracing::debug!(url = %label, "fetching page");
        self.policy
            .run(&label, || self.get_once(url, &label))
            .await
    }
}

/// Replace the values of credential query parameters with `***`.
#[must_use]
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return url.to_owned();
    };
    if parsed.query().is_none() {
        return url.to_owned();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
