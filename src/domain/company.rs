use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyListing {
    pub name: String,
    pub link: String,
}

/// One row of the output file. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompanyDetail {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingPage {
    pub companies: Vec<CompanyListing>,
    pub has_next: bool,
}

impl ListingPage {
    pub fn empty() -> Self {
        ListingPage::default()
    }

    pub fn is_last(&self) -> bool {
        self.companies.is_empty() || !self.has_next
    }
}
