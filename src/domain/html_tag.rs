use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;

use super::company::{CompanyDetail, CompanyListing};

// Listing page (/companies?page=N)
pub const LISTING_READY: &str = ".ui.segment";
pub const COMPANY_ITEM: &str = ".company-list .company.item";
pub const COMPANY_ITEM_NAME: &str = ".header.name";
pub const COMPANY_ITEM_LINK: &str = ".link";
pub const NEXT_PAGE: &str = "#pagination-wrapper > div > a:nth-child(4)";

// Detail page
pub const DETAIL_READY: &str = "div.company-main";
pub const DETAIL_ROOT: &str = "div.pusher";
pub const DETAIL_NAME: &str = "#company-name > h1";
pub const DETAIL_EMAIL: &str = "#company-email";
pub const DETAIL_PHONE: &str = "#company-phone";
pub const DETAIL_DESCRIPTION: &str = "#company-description";

// Login page
pub const LOGIN_EMAIL: &str = "#id-login-email";
pub const LOGIN_PASSWORD: &str = "#id-login-password";
pub const LOGIN_SUBMIT: &str = "button[type='submit']";

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().join(" ")
}

fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}

fn first_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

pub fn extract_company_listings(page_source: &str, base_url: &Url) -> Vec<CompanyListing> {
    let item_selector = Selector::parse(COMPANY_ITEM).unwrap();
    let name_selector = Selector::parse(COMPANY_ITEM_NAME).unwrap();
    let link_selector = Selector::parse(COMPANY_ITEM_LINK).unwrap();

    let document = Html::parse_document(page_source);

    document
        .select(&item_selector)
        .filter_map(|item| {
            let name = first_text(item, &name_selector).filter(|name| !name.is_empty());
            let href = item
                .select(&link_selector)
                .next()
                .and_then(|a_tag| a_tag.value().attr("href"))
                .map(str::trim);

            match (name, href) {
                (Some(name), Some(href)) => match base_url.join(href) {
                    Ok(link) => Some(CompanyListing {
                        name,
                        link: link.to_string(),
                    }),
                    Err(e) => {
                        log::warn!("Skipping '{}' with unusable link {}: {:?}", name, href, e);
                        None
                    }
                },
                (name, href) => {
                    log::warn!(
                        "Skipping company item with name {:?} and link {:?}",
                        name,
                        href
                    );
                    None
                }
            }
        })
        .collect()
}

pub fn count_company_items(page_source: &str) -> usize {
    let item_selector = Selector::parse(COMPANY_ITEM).unwrap();
    Html::parse_document(page_source)
        .select(&item_selector)
        .count()
}

pub fn has_next_page(page_source: &str) -> bool {
    let next_selector = Selector::parse(NEXT_PAGE).unwrap();
    Html::parse_document(page_source)
        .select(&next_selector)
        .next()
        .is_some()
}

pub fn contains_selector(page_source: &str, selector: &str) -> bool {
    match Selector::parse(selector) {
        Ok(selector) => Html::parse_document(page_source)
            .select(&selector)
            .next()
            .is_some(),
        Err(_) => false,
    }
}

/// Reads a detail page. `fallback_name` fills the name when the page has no heading.
pub fn extract_company_detail(
    page_source: &str,
    fallback_name: &str,
) -> Result<CompanyDetail, ScrapeError> {
    let root_selector = Selector::parse(DETAIL_ROOT).unwrap();
    let name_selector = Selector::parse(DETAIL_NAME).unwrap();
    let email_selector = Selector::parse(DETAIL_EMAIL).unwrap();
    let phone_selector = Selector::parse(DETAIL_PHONE).unwrap();
    let description_selector = Selector::parse(DETAIL_DESCRIPTION).unwrap();

    let document = Html::parse_document(page_source);
    let root = document
        .select(&root_selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement(DETAIL_ROOT.to_string()))?;

    let name = first_text(root, &name_selector)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| clean_text(fallback_name));

    Ok(CompanyDetail {
        name,
        email: first_text(root, &email_selector).unwrap_or_default(),
        phone: first_text(root, &phone_selector).unwrap_or_default(),
        description: first_text(root, &description_selector).unwrap_or_default(),
    })
}
