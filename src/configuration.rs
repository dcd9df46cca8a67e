use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub prober: ProberSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default)]
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = match self.require_ssl {
            true => PgSslMode::Require,
            false => PgSslMode::Prefer,
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

/// Browser session and pacing for the listing scraper. Every delay is in milliseconds.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ScraperSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub locale: String,
    pub window_width: u32,
    pub window_height: u32,
    pub timings: ScraperTimings,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        ScraperSettings {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            user_agent: BROWSER_USER_AGENT.to_string(),
            locale: "id-ID".to_string(),
            window_width: 1280,
            window_height: 900,
            timings: ScraperTimings::default(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ScraperTimings {
    pub navigation_timeout_ms: u64,
    pub consent_pause_ms: u64,
    pub feed_timeout_ms: u64,
    pub anchor_fallback_timeout_ms: u64,
    pub scroll_pause_ms: u64,
    pub stuck_retry_pause_ms: u64,
    pub detail_navigation_timeout_ms: u64,
    pub heading_timeout_ms: u64,
    pub heading_grace_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ScraperTimings {
    fn default() -> Self {
        ScraperTimings {
            navigation_timeout_ms: 45_000,
            consent_pause_ms: 2_000,
            feed_timeout_ms: 20_000,
            anchor_fallback_timeout_ms: 10_000,
            scroll_pause_ms: 2_000,
            stuck_retry_pause_ms: 1_500,
            detail_navigation_timeout_ms: 20_000,
            heading_timeout_ms: 8_000,
            heading_grace_ms: 3_000,
            poll_interval_ms: 250,
        }
    }
}

impl ScraperTimings {
    /// No pauses at all, for driving a scripted surface.
    pub fn immediate() -> Self {
        ScraperTimings {
            navigation_timeout_ms: 0,
            consent_pause_ms: 0,
            feed_timeout_ms: 0,
            anchor_fallback_timeout_ms: 0,
            scroll_pause_ms: 0,
            stuck_retry_pause_ms: 0,
            detail_navigation_timeout_ms: 0,
            heading_timeout_ms: 0,
            heading_grace_ms: 0,
            poll_interval_ms: 0,
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn consent_pause(&self) -> Duration {
        Duration::from_millis(self.consent_pause_ms)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_millis(self.feed_timeout_ms)
    }

    pub fn anchor_fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.anchor_fallback_timeout_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn stuck_retry_pause(&self) -> Duration {
        Duration::from_millis(self.stuck_retry_pause_ms)
    }

    pub fn detail_navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_navigation_timeout_ms)
    }

    pub fn heading_timeout(&self) -> Duration {
        Duration::from_millis(self.heading_timeout_ms)
    }

    pub fn heading_grace(&self) -> Duration {
        Duration::from_millis(self.heading_grace_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ProberSettings {
    pub timeout_ms: u64,
    pub pause_ms: u64,
    pub user_agent: String,
}

impl Default for ProberSettings {
    fn default() -> Self {
        ProberSettings {
            timeout_ms: 8_000,
            pause_ms: 500,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl ProberSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
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
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No working directory: {}", e)))?;
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
        // APP_APPLICATION__PORT=5001 sets `application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
