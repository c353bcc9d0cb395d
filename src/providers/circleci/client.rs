use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use url::Url;

use super::urls::redacted;
use crate::error::{CIToolError, Result};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// HTTP client for the CircleCI v1.1 REST API.
///
/// Pages are fetched one at a time. Transport and body-read failures are retried
/// with a linear backoff: before attempt `n` the client waits `n - 1` delay units.
pub struct CircleCiClient {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl CircleCiClient {
    pub fn new(max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(CIToolError::Config(
                "at least one fetch attempt is required".to_string(),
            ));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| CIToolError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_attempts,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Delay before the given 1-based attempt: none before the first, then one more
    /// delay unit per attempt.
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt.saturating_sub(1)
    }

    /// Fetches one page and returns its body, which must be a JSON array.
    ///
    /// Any status other than 200 aborts immediately without retrying.
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        let shown = redacted(url);
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.backoff(attempt)).await;
            debug!("Fetching {shown} (attempt {attempt}/{})", self.max_attempts);

            let request = self
                .client
                .get(url.clone())
                .header(ACCEPT, "application/json")
                .header(USER_AGENT, concat!("citool/", env!("CARGO_PKG_VERSION")));

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        "Failed to fetch on try {attempt}/{}: {shown} ({e})",
                        self.max_attempts
                    );
                    last_error = Some(e);
                    continue;
                }
            };

            let status = response.status();
            if status != StatusCode::OK {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(CIToolError::Api {
                    status: status.as_u16(),
                    message: format!("{shown}: {message}"),
                });
            }

            match response.text().await {
                Ok(body) => {
                    ensure_json_array(&body)?;
                    return Ok(body);
                }
                Err(e) => {
                    warn!(
                        "Failed to read body on try {attempt}/{}: {shown} ({e})",
                        self.max_attempts
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => Err(CIToolError::RetriesExhausted {
                url: shown,
                attempts: self.max_attempts,
                source,
            }),
            None => Err(CIToolError::UnexpectedResponse(format!(
                "no attempt was made to fetch {shown}"
            ))),
        }
    }
}

fn ensure_json_array(body: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Array(_)) => Ok(()),
        Ok(other) => Err(CIToolError::UnexpectedResponse(format!(
            "expected a JSON array of build results, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(CIToolError::UnexpectedResponse(format!(
            "response body is not valid JSON: {e}"
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
