use crate::domain::ports::{PageSource, RunObserver};
use crate::utils::error::{FetchFailure, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub timeout: Duration,
    /// Delay after the first failed attempt; doubles after each further failure.
    pub retry_base_delay: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Page fetcher with bounded exponential-backoff retries.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
    observer: Arc<dyn RunObserver>,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig, observer: Arc<dyn RunObserver>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            observer,
        })
    }

    /// Wait before retrying after failed attempt number `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config.retry_base_delay.saturating_mul(factor)
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("HTTP {} from {}", response.status(), url);
        response.text().await
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchFailure> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            tracing::debug!("HTTP request attempt {}/{} for {}", attempt, max_attempts, url);

            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    last_error = if e.is_timeout() {
                        format!("timed out after {:?}", self.config.timeout)
                    } else {
                        e.to_string()
                    };
                    self.observer.fetch_retry(url, attempt, &last_error);

                    if attempt < max_attempts {
                        tokio::time::sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(FetchFailure {
            url: url.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::observer::recording::{Event, RecordingObserver};
    use crate::adapters::observer::TracingObserver;
    use httpmock::prelude::*;

    fn fast_fetcher(max_attempts: u32) -> HttpFetcher {
        let config = FetchConfig {
            max_attempts,
            timeout: Duration::from_secs(5),
            retry_base_delay: Duration::from_millis(1),
            ..FetchConfig::default()
        };
        HttpFetcher::new(config, Arc::new(TracingObserver)).unwrap()
    }

    #[test]
    fn test_backoff_doubles() {
        let fetcher = HttpFetcher::new(FetchConfig::default(), Arc::new(TracingObserver)).unwrap();
        assert_eq!(fetcher.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(fetcher.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(fetcher.backoff_delay(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_browser_agent() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET)
                .path("/travel/passenger-volumes")
                .header("user-agent", DEFAULT_USER_AGENT);
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<html><table></table></html>");
        });

        let fetcher = fast_fetcher(3);
        let body = fetcher
            .fetch(&server.url("/travel/passenger-volumes"))
            .await
            .unwrap();

        page.assert();
        assert!(body.contains("<table>"));
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_attempts() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET).path("/travel/passenger-volumes/2023");
            then.status(503);
        });

        let fetcher = fast_fetcher(3);
        let url = server.url("/travel/passenger-volumes/2023");
        let failure = fetcher.fetch(&url).await.unwrap_err();

        page.assert_hits(3);
        assert_eq!(failure.url, url);
        assert_eq!(failure.attempts, 3);
        assert!(failure.last_error.contains("503"));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(404);
        });

        let fetcher = fast_fetcher(0);
        let failure = fetcher.fetch(&server.url("/")).await.unwrap_err();

        page.assert_hits(1);
        assert_eq!(failure.attempts, 1);
    }

    #[tokio::test]
    async fn test_timeout_is_retried_and_reported() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET).path("/travel/passenger-volumes/2022");
            then.status(200)
                .body("<html></html>")
                .delay(Duration::from_millis(800));
        });

        let config = FetchConfig {
            max_attempts: 2,
            timeout: Duration::from_millis(100),
            retry_base_delay: Duration::from_millis(1),
            ..FetchConfig::default()
        };
        let observer = Arc::new(RecordingObserver::default());
        let fetcher = HttpFetcher::new(config, observer.clone()).unwrap();
        let failure = fetcher
            .fetch(&server.url("/travel/passenger-volumes/2022"))
            .await
            .unwrap_err();

        page.assert_hits(2);
        assert_eq!(failure.attempts, 2);
        assert!(failure.last_error.contains("timed out"), "{}", failure.last_error);
        assert_eq!(observer.events(), vec![Event::Retry(1), Event::Retry(2)]);
    }

    #[tokio::test]
    async fn test_recovers_when_a_later_attempt_succeeds() {
        let server = MockServer::start_async().await;
        let failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/travel/passenger-volumes/2021");
                then.status(503);
            })
            .await;

        let config = FetchConfig {
            max_attempts: 3,
            timeout: Duration::from_secs(5),
            retry_base_delay: Duration::from_millis(400),
            ..FetchConfig::default()
        };
        let observer = Arc::new(RecordingObserver::default());
        let fetcher = HttpFetcher::new(config, observer.clone()).unwrap();
        let url = server.url("/travel/passenger-volumes/2021");

        // swap the 503 for a 200 while the fetcher backs off after the first failure
        let recover = async {
            while failing.hits_async().await == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            failing.delete_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/travel/passenger-volumes/2021");
                    then.status(200).body("<html><table></table></html>");
                })
                .await
        };
        let (body, recovered) = tokio::join!(fetcher.fetch(&url), recover);

        assert!(body.unwrap().contains("<table>"));
        recovered.assert_hits_async(1).await;
        assert_eq!(observer.events(), vec![Event::Retry(1)]);
    }
}
