use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thirtyfour::{
    prelude::ElementQueryable, By, ChromeCapabilities, ChromiumLikeCapabilities, Cookie,
    DesiredCapabilities, WebDriver,
};
use tokio::sync::RwLock;
use url::Url;

use crate::{configuration::BrowserSettings, error::ScrapeError};

use super::browser::{Browser, Page};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Chrome driven through a WebDriver server (chromedriver). Each page is its own
/// session, so pages never share navigation state, only the adopted cookies.
pub struct Droid {
    server_url: String,
    capabilities: ChromeCapabilities,
    origin: Url,
    maximize: bool,
    cookies: RwLock<Vec<Cookie>>,
}

pub struct DroidPage {
    driver: WebDriver,
}

impl Droid {
    pub fn new(settings: &BrowserSettings, origin: Url) -> Result<Self, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();

        caps.add_arg(&format!("--lang={}", settings.locale))?;
        caps.add_experimental_option(
            "prefs",
            json!({ "intl.accept_languages": settings.accept_language }),
        )?;
        if settings.headless {
            caps.set_headless()?;
        }
        if let Some(binary) = &settings.binary {
            caps.set_binary(binary)?;
        }

        Ok(Droid {
            server_url: settings.webdriver_url.clone(),
            capabilities: caps,
            origin,
            maximize: !settings.headless,
            cookies: RwLock::new(vec![]),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn restore_cookies(&self, driver: &WebDriver) -> Result<(), ScrapeError> {
        let cookies = self.cookies.read().await.clone();
        if cookies.is_empty() {
            return Ok(());
        }

        // Cookies can only be set for the domain that is currently loaded
        driver.goto(self.origin.as_str()).await?;
        for cookie in cookies {
            let name = cookie.name.clone();
            if let Err(e) = driver.add_cookie(cookie).await {
                log::warn!("Failed to restore cookie {}: {:?}", name, e);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Browser for Droid {
    type Page = DroidPage;

    async fn new_page(&self) -> Result<DroidPage, ScrapeError> {
        let driver = WebDriver::new(self.server_url.as_str(), self.capabilities.clone()).await?;

        let setup = async {
            if self.maximize {
                driver.maximize_window().await?;
            }
            self.restore_cookies(&driver).await
        };

        if let Err(e) = setup.await {
            if let Err(quit_error) = driver.quit().await {
                log::warn!("Failed to quit half-opened session: {:?}", quit_error);
            }
            return Err(e);
        }

        Ok(DroidPage { driver })
    }

    async fn adopt_session(&self, page: &DroidPage) -> Result<(), ScrapeError> {
        let cookies = page.driver.get_all_cookies().await?;
        log::info!("Adopted {} session cookies", cookies.len());
        *self.cookies.write().await = cookies;
        Ok(())
    }
}

#[async_trait]
impl Page for DroidPage {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        self.driver
            .query(By::Css(selector))
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), ScrapeError> {
        let input = self.driver.find(By::Css(selector)).await?;
        input.clear().await?;
        input.send_keys(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), ScrapeError> {
        self.driver.find(By::Css(selector)).await?.click().await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn source(&self) -> Result<String, ScrapeError> {
        Ok(self.driver.source().await?)
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        self.driver.clone().quit().await?;
        Ok(())
    }
}
