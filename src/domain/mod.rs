pub mod company;
pub mod credentials;
pub mod html_tag;
