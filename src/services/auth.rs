use std::time::Duration;

use url::Url;

use crate::{
    domain::{
        credentials::Credentials,
        html_tag::{LOGIN_EMAIL, LOGIN_PASSWORD, LOGIN_SUBMIT},
    },
    error::ScrapeError,
};

use super::browser::{close_page, Browser, Page};

pub fn login_url(base_url: &Url) -> Result<Url, ScrapeError> {
    Ok(base_url.join("/login")?)
}

/// Submits the login form and waits for the site to navigate away from it.
/// Every failure is reported as `ScrapeError::Authentication`.
pub async fn login<B: Browser>(
    browser: &B,
    base_url: &Url,
    credentials: &Credentials,
    wait_timeout: Duration,
    navigation_timeout: Duration,
) -> Result<(), ScrapeError> {
    let url = login_url(base_url)?;
    let page = browser
        .new_page()
        .await
        .map_err(|e| ScrapeError::Authentication(e.to_string()))?;

    let result = async {
        submit_login_form(&page, url.as_str(), credentials, wait_timeout).await?;

        // Compare against the url the browser reports, which may be normalised
        let login_page_url = page.current_url().await?;
        page.click(LOGIN_SUBMIT).await?;
        page.wait_for_navigation(&login_page_url, navigation_timeout).await?;

        browser.adopt_session(&page).await
    }
    .await
    .map_err(|e| {
        log::error!("Login as {} failed: {:?}", credentials.email_or_phone, e);
        match e {
            ScrapeError::Authentication(reason) => ScrapeError::Authentication(reason),
            other => ScrapeError::Authentication(other.to_string()),
        }
    });

    close_page(page, result).await?;
    log::info!("Logged in as {}", credentials.email_or_phone);
    Ok(())
}

async fn submit_login_form<P: Page>(
    page: &P,
    url: &str,
    credentials: &Credentials,
    wait_timeout: Duration,
) -> Result<(), ScrapeError> {
    page.goto(url).await?;
    page.wait_for(LOGIN_EMAIL, wait_timeout).await?;
    page.fill(LOGIN_EMAIL, &credentials.email_or_phone).await?;
    page.fill(LOGIN_PASSWORD, &credentials.password).await?;
    Ok(())
}
