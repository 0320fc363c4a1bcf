use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use url::Url;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub browser: BrowserSettings,
    pub site: SiteSettings,
    pub scraper: ScraperSettings,
    pub output: OutputSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub locale: String,
    pub accept_language: String,
    /// Chrome/Chromium executable. The driver picks its default when unset.
    pub binary: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SiteSettings {
    pub base_url: String,
}

impl SiteSettings {
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ScraperSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_concurrent_requests: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub login_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub wait_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_listing_failures: u32,
    #[serde(default)]
    pub max_pages: Option<u32>,
}

impl ScraperSettings {
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Zero would stall the detail stream, so it is bumped to one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_requests.max(1)
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        ScraperSettings {
            max_concurrent_requests: 10,
            login_timeout_secs: 5,
            wait_timeout_secs: 30,
            max_listing_failures: 3,
            max_pages: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct OutputSettings {
    pub path: PathBuf,
    #[serde(default)]
    pub write_every_page: bool,
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        // APP_SCRAPER__MAX_CONCURRENT_REQUESTS=5 sets `scraper.max_concurrent_requests`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
