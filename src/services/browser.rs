use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScrapeError;

/// A browser that hands out isolated pages sharing one login session.
#[async_trait]
pub trait Browser: Send + Sync {
    type Page: Page;

    async fn new_page(&self) -> Result<Self::Page, ScrapeError>;

    /// Makes the session state of `page` (cookies) the one every later page starts with.
    async fn adopt_session(&self, page: &Self::Page) -> Result<(), ScrapeError>;
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError>;

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), ScrapeError>;

    async fn click(&self, selector: &str) -> Result<(), ScrapeError>;

    async fn current_url(&self) -> Result<String, ScrapeError>;

    async fn source(&self) -> Result<String, ScrapeError>;

    async fn close(&self) -> Result<(), ScrapeError>;

    /// Polls the current url until it is no longer `from`.
    async fn wait_for_navigation(&self, from: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let poll = async {
            loop {
                if self.current_url().await? != from {
                    return Ok::<(), ScrapeError>(());
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::Timeout {
                what: format!("navigation away from {}", from),
                secs: timeout.as_secs(),
            }),
        }
    }
}

/// Closes `page` and passes `result` through. A failed close is only logged.
pub async fn close_page<P: Page, T>(
    page: P,
    result: Result<T, ScrapeError>,
) -> Result<T, ScrapeError> {
    if let Err(e) = page.close().await {
        log::warn!("Failed to close page: {:?}", e);
    }
    result
}
