// src/publish/twitter.rs
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Publisher;

const TWEETS_ENDPOINT: &str = "https://api.twitter.com/2/tweets";

/// Posts statuses through the Twitter v2 API with an OAuth2 user-context
/// access token.
#[derive(Clone)]
pub struct TwitterPublisher {
    access_token: String,
    endpoint: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl TwitterPublisher {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            endpoint: TWEETS_ENDPOINT.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Point at a different endpoint (tests, API-compatible mirrors).
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[derive(Serialize)]
struct TweetBody<'a> {
    text: &'a str,
}

#[async_trait::async_trait]
impl Publisher for TwitterPublisher {
    async fn publish(&self, text: &str) -> Result<()> {
        let body = TweetBody { text };

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.access_token)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("tweet HTTP error: {e}"));
                    }
                    tracing::info!(status = %text, "published");
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("tweet request failed: {e}"));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}
