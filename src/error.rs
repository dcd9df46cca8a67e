use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
    #[error("navigation to {url} timed out")]
    NavigationTimeout { url: String },
    #[error("unexpected script result: {0}")]
    Script(String),
}

/// Failures that end a whole extraction run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("search keyword and location must not be empty")]
    EmptyQuery,
    #[error("maxResults must be a positive integer")]
    InvalidMaxResults,
    #[error("could not start a browser session: {0}")]
    Launch(SurfaceError),
    #[error("Google Maps did not load results for {query:?}")]
    DiscoveryUnavailable { query: String },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Why a single listing produced no lead. Logged and skipped, never fatal.
#[derive(Debug, Error)]
pub enum ListingSkipped {
    #[error("no business name found on {0}")]
    MissingName(String),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
