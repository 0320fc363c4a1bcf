pub mod auth;
pub mod browser;
pub mod company_scraper;
pub mod csv_export;
pub mod droid;

pub use browser::*;
pub use csv_export::*;
pub use droid::*;
