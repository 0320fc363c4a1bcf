use futures::{stream, StreamExt};
use url::Url;

use crate::{
    configuration::ScraperSettings,
    console,
    domain::{
        company::{CompanyDetail, CompanyListing, ListingPage},
        html_tag::{
            count_company_items, extract_company_detail, extract_company_listings, has_next_page,
            COMPANY_ITEM, DETAIL_READY, LISTING_READY,
        },
    },
    error::ScrapeError,
};

use super::{
    browser::{close_page, Browser, Page},
    csv_export::CsvExport,
};

pub fn listing_url(base_url: &Url, page_number: u32) -> Result<Url, ScrapeError> {
    let mut url = base_url.join("/companies")?;
    url.query_pairs_mut().append_pair("page", &page_number.to_string());
    Ok(url)
}

pub async fn fetch_listing_page<B: Browser>(
    browser: &B,
    base_url: &Url,
    page_number: u32,
    settings: &ScraperSettings,
) -> Result<ListingPage, ScrapeError> {
    let url = listing_url(base_url, page_number)?;
    let page = browser.new_page().await?;
    let result = read_listing_page(&page, &url, base_url, settings).await;
    close_page(page, result).await
}

async fn read_listing_page<P: Page>(
    page: &P,
    url: &Url,
    base_url: &Url,
    settings: &ScraperSettings,
) -> Result<ListingPage, ScrapeError> {
    page.goto(url.as_str()).await?;
    page.wait_for(LISTING_READY, settings.wait_timeout()).await?;
    let page_source = page.source().await?;

    let items = count_company_items(&page_source);
    if items == 0 {
        return Ok(ListingPage::empty());
    }

    // Items are there but none could be read: the markup changed, not the listing ended
    let companies = extract_company_listings(&page_source, base_url);
    if companies.is_empty() {
        return Err(ScrapeError::MissingElement(format!(
            "name or link in all {} '{}' items",
            items, COMPANY_ITEM
        )));
    }

    Ok(ListingPage {
        has_next: has_next_page(&page_source),
        companies,
    })
}

pub async fn fetch_company_detail<B: Browser>(
    browser: &B,
    listing: &CompanyListing,
    settings: &ScraperSettings,
) -> Result<CompanyDetail, ScrapeError> {
    let page = browser.new_page().await?;

    let result = async {
        page.goto(&listing.link).await?;
        page.wait_for(DETAIL_READY, settings.wait_timeout()).await?;
        let page_source = page.source().await?;
        extract_company_detail(&page_source, &listing.name)
    }
    .await;

    close_page(page, result).await
}

/// Fetches every listing's detail page with at most `settings.concurrency()` in
/// flight. Failed fetches are logged and left out. Order follows completion.
pub async fn fetch_company_details<B: Browser>(
    browser: &B,
    listings: &[CompanyListing],
    settings: &ScraperSettings,
) -> Vec<CompanyDetail> {
    stream::iter(listings)
        .map(|listing| async move {
            match fetch_company_detail(browser, listing, settings).await {
                Ok(detail) => {
                    console::company_collected(&detail.name);
                    Some(detail)
                }
                Err(e) => {
                    log::error!("Failed to scrape company page {}: {:?}", listing.link, e);
                    console::error(&format!(
                        "'{}'의 정보를 가져오는 중 오류가 발생했습니다: {}",
                        listing.link, e
                    ));
                    None
                }
            }
        })
        .buffer_unordered(settings.concurrency())
        .filter_map(|detail| async move { detail })
        .collect()
        .await
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    pub companies: Vec<CompanyDetail>,
    /// Listing pages requested, the page that ended the crawl included.
    pub pages_visited: u32,
    pub failed_pages: u32,
}

/// Walks the listing from page 1 until a page is empty or has no next page.
/// When `snapshot` is set the file is rewritten after every page.
pub async fn crawl<B: Browser>(
    browser: &B,
    base_url: &Url,
    settings: &ScraperSettings,
    snapshot: Option<&CsvExport>,
) -> CrawlReport {
    let mut report = CrawlReport::default();
    let mut consecutive_failures = 0;
    let mut page_number = 1;

    loop {
        if let Some(max_pages) = settings.max_pages {
            if page_number > max_pages {
                log::info!("Reached page limit of {}", max_pages);
                break;
            }
        }

        report.pages_visited += 1;

        let listing_page = match fetch_listing_page(browser, base_url, page_number, settings).await
        {
            Ok(listing_page) => {
                consecutive_failures = 0;
                listing_page
            }
            Err(e) => {
                log::error!("Failed to scrape listing page {}: {:?}", page_number, e);
                console::error(&format!(
                    "'{} 페이지'의 정보를 가져오는 중 오류가 발생했습니다: {}",
                    page_number, e
                ));
                report.failed_pages += 1;
                consecutive_failures += 1;
                if consecutive_failures >= settings.max_listing_failures.max(1) {
                    log::error!(
                        "Giving up after {} failed listing pages in a row",
                        consecutive_failures
                    );
                    break;
                }
                page_number += 1;
                continue;
            }
        };

        if listing_page.companies.is_empty() {
            log::info!("Page {} has no companies, stopping", page_number);
            break;
        }

        console::page_started(page_number, listing_page.companies.len());
        let details = fetch_company_details(browser, &listing_page.companies, settings).await;
        log::info!(
            "Page {}: collected {} of {} companies",
            page_number,
            details.len(),
            listing_page.companies.len()
        );
        report.companies.extend(details);

        if let Some(export) = snapshot {
            if let Err(e) = export.write_all(&report.companies) {
                log::error!("Failed to write snapshot to {:?}: {:?}", export.path(), e);
            }
        }

        if listing_page.is_last() {
            break;
        }
        page_number += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::Ordering, time::Duration};

    use url::Url;

    use super::*;
    use crate::services::browser::mock::MockBrowser;

    const BASE: &str = "https://www.rocketpunch.com";

    fn base() -> Url {
        Url::parse(BASE).unwrap()
    }

    fn page_url(n: u32) -> String {
        format!("{}/companies?page={}", BASE, n)
    }

    fn detail_url(slug: &str) -> String {
        format!("{}/companies/{}", BASE, slug)
    }

    fn listing_html(slugs: &[&str], has_next: bool) -> String {
        let items: String = slugs
            .iter()
            .map(|slug| {
                format!(
                    r#"<div class="company item"><a class="link" href="/companies/{slug}"><h4 class="header name">{slug}</h4></a></div>"#
                )
            })
            .collect();
        let anchors = match has_next {
            true => "<a>1</a><a>2</a><a>3</a><a>다음</a>",
            false => "<a>1</a><a>2</a><a>3</a>",
        };
        format!(
            r#"<html><body><div class="ui segment"><div class="company-list">{items}</div></div>
            <div id="pagination-wrapper"><div>{anchors}</div></div></body></html>"#
        )
    }

    fn detail_html(name: &str) -> String {
        format!(
            r#"<html><body><div class="pusher"><div class="company-main">
            <div id="company-name"><h1>{name}</h1></div>
            <div id="company-email">{name}@example.com</div>
            </div></div></body></html>"#
        )
    }

    fn settings(max_concurrent_requests: usize) -> ScraperSettings {
        ScraperSettings {
            max_concurrent_requests,
            wait_timeout_secs: 1,
            ..Default::default()
        }
    }

    #[test]
    fn listing_url_carries_page_number() {
        assert_eq!(
            listing_url(&base(), 3).unwrap().as_str(),
            "https://www.rocketpunch.com/companies?page=3"
        );
    }

    #[tokio::test]
    async fn empty_listing_page_skips_next_page_check() {
        // The next control is present but must be ignored
        let browser = MockBrowser::default().with_page(&page_url(1), &listing_html(&[], true));

        let listing_page = fetch_listing_page(&browser, &base(), 1, &settings(2))
            .await
            .unwrap();

        assert!(listing_page.companies.is_empty());
        assert!(!listing_page.has_next);
    }

    #[tokio::test]
    async fn detail_fetch_closes_page_on_failure() {
        let browser = MockBrowser::default().with_failing(&detail_url("gone"));
        let listing = CompanyListing {
            name: "gone".to_string(),
            link: detail_url("gone"),
        };

        let result = fetch_company_detail(&browser, &listing, &settings(2)).await;

        assert!(result.is_err());
        assert_eq!(browser.counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(browser.counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn detail_fetches_stay_within_concurrency_limit() {
        let slugs = ["a", "b", "c", "d", "e", "f", "g"];
        let mut browser = MockBrowser {
            load_delay: Duration::from_millis(20),
            ..Default::default()
        };
        for slug in slugs {
            browser = browser.with_page(&detail_url(slug), &detail_html(slug));
        }
        let listings: Vec<CompanyListing> = slugs
            .iter()
            .map(|slug| CompanyListing {
                name: slug.to_string(),
                link: detail_url(slug),
            })
            .collect();

        let details = fetch_company_details(&browser, &listings, &settings(3)).await;

        assert_eq!(details.len(), slugs.len());
        let counters = &browser.counters;
        assert!(counters.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert!(counters.max_in_flight.load(Ordering::SeqCst) > 1);
        assert_eq!(
            counters.opened.load(Ordering::SeqCst),
            counters.closed.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn failed_details_are_left_out() {
        let browser = MockBrowser::default()
            .with_page(&detail_url("ok"), &detail_html("ok"))
            .with_failing(&detail_url("broken"));
        let listings = vec![
            CompanyListing {
                name: "ok".to_string(),
                link: detail_url("ok"),
            },
            CompanyListing {
                name: "broken".to_string(),
                link: detail_url("broken"),
            },
        ];

        let details = fetch_company_details(&browser, &listings, &settings(5)).await;

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].email, "ok@example.com");
    }

    #[tokio::test]
    async fn crawl_stops_after_page_without_next_control() {
        let dir = tempfile::tempdir().unwrap();
        let export = CsvExport::new(dir.path().join("companies.csv"));
        let browser = MockBrowser::default()
            .with_page(&page_url(1), &listing_html(&["acme", "globex"], true))
            .with_page(&page_url(2), &listing_html(&["initech"], false))
            .with_page(&detail_url("acme"), &detail_html("acme"))
            .with_page(&detail_url("globex"), &detail_html("globex"))
            .with_page(&detail_url("initech"), &detail_html("initech"));

        let report = crawl(&browser, &base(), &settings(10), None).await;
        export.write_all(&report.companies).unwrap();

        assert_eq!(report.pages_visited, 2);
        assert_eq!(browser.visits_to("/companies?page="), 2);
        assert_eq!(report.companies.len(), 3);

        let written = std::fs::read_to_string(export.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "name,email,phone,description");
        assert_eq!(lines.len() - 1, 3);
    }

    #[tokio::test]
    async fn crawl_stops_on_empty_page() {
        let browser = MockBrowser::default()
            .with_page(&page_url(1), &listing_html(&["acme"], true))
            .with_page(&page_url(2), &listing_html(&[], true))
            .with_page(&detail_url("acme"), &detail_html("acme"));

        let report = crawl(&browser, &base(), &settings(10), None).await;

        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.companies.len(), 1);
        assert_eq!(browser.visits_to("page=3"), 0);
    }

    #[tokio::test]
    async fn crawl_skips_failed_listing_page_and_gives_up_on_repeated_failures() {
        let browser = MockBrowser::default()
            .with_page(&page_url(1), &listing_html(&["acme"], true))
            .with_failing(&page_url(2))
            .with_page(&page_url(3), &listing_html(&["globex"], true))
            .with_page(&detail_url("acme"), &detail_html("acme"))
            .with_page(&detail_url("globex"), &detail_html("globex"));
        // Pages 4 and 5 are unknown to the mock and fail as well
        let settings = ScraperSettings {
            max_listing_failures: 2,
            ..settings(10)
        };

        let report = crawl(&browser, &base(), &settings, None).await;

        assert_eq!(report.companies.len(), 2);
        assert_eq!(report.failed_pages, 3);
        assert_eq!(report.pages_visited, 5);
        assert_eq!(
            browser.counters.opened.load(Ordering::SeqCst),
            browser.counters.closed.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn unreadable_items_count_as_failed_listing_page() {
        let unreadable = r#"<html><body><div class="ui segment"><div class="company-list">
            <div class="company item"><h4 class="header name">No Link Inc</h4></div>
            </div></div>
            <div id="pagination-wrapper"><div><a>1</a><a>2</a><a>3</a><a>다음</a></div></div>
            </body></html>"#;
        let browser = MockBrowser::default()
            .with_page(&page_url(1), unreadable)
            .with_page(&page_url(2), &listing_html(&["acme"], false))
            .with_page(&detail_url("acme"), &detail_html("acme"));

        let listing = fetch_listing_page(&browser, &base(), 1, &settings(10)).await;
        assert!(matches!(listing, Err(ScrapeError::MissingElement(_))));

        let report = crawl(&browser, &base(), &settings(10), None).await;

        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.failed_pages, 1);
        assert_eq!(report.companies.len(), 1);
        assert_eq!(
            browser.counters.opened.load(Ordering::SeqCst),
            browser.counters.closed.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn crawl_writes_snapshot_after_each_page() {
        let dir = tempfile::tempdir().unwrap();
        let export = CsvExport::new(dir.path().join("companies.csv"));
        let browser = MockBrowser::default()
            .with_page(&page_url(1), &listing_html(&["acme"], false))
            .with_page(&detail_url("acme"), &detail_html("acme"));

        crawl(&browser, &base(), &settings(10), Some(&export)).await;

        let written = std::fs::read_to_string(export.path()).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[tokio::test]
    async fn crawl_respects_page_limit() {
        let browser = MockBrowser::default()
            .with_page(&page_url(1), &listing_html(&["acme"], true))
            .with_page(&detail_url("acme"), &detail_html("acme"));
        let settings = ScraperSettings {
            max_pages: Some(1),
            ..settings(10)
        };

        let report = crawl(&browser, &base(), &settings, None).await;

        assert_eq!(report.pages_visited, 1);
        assert_eq!(report.companies.len(), 1);
    }
}
