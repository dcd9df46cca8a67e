use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thirtyfour::{prelude::*, ChromiumLikeCapabilities};
use tokio::time::{self, Instant};

use crate::{
    configuration::ScraperSettings,
    error::SurfaceError,
    services::{Extraction, RenderingSurface, SurfaceLauncher},
};

const SCROLL_TO_END_JS: &str = r#"
    const el = document.querySelector(arguments[0]);
    if (el) { el.scrollTo(0, el.scrollHeight); }
"#;

const AT_BOTTOM_JS: &str = r#"
    const el = document.querySelector(arguments[0]);
    return !!el && Math.abs(el.scrollHeight - el.scrollTop - el.clientHeight) < 5;
"#;

const HREFS_JS: &str = r#"
    return Array.from(document.querySelectorAll(arguments[0])).map(a => a.href);
"#;

/// A Chrome page driven over WebDriver.
pub struct Droid {
    pub driver: WebDriver,
    poll_interval: Duration,
    page_load_timeout: Option<Duration>,
}

impl Droid {
    pub async fn new(settings: &ScraperSettings) -> Result<Self, SurfaceError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-setuid-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg(&format!("--user-agent={}", settings.user_agent))?;
        caps.add_arg(&format!("--lang={}", settings.locale))?;
        caps.add_arg(&format!(
            "--window-size={},{}",
            settings.window_width, settings.window_height
        ))?;

        let driver = WebDriver::new(&settings.webdriver_url, caps).await?;
        log::info!("Opened browser session on {}", settings.webdriver_url);

        Ok(Droid {
            driver,
            poll_interval: settings.timings.poll_interval(),
            page_load_timeout: None,
        })
    }

    async fn first(&self, selector: &str) -> Result<Option<WebElement>, SurfaceError> {
        Ok(self
            .driver
            .find_all(By::Css(selector))
            .await?
            .into_iter()
            .next())
    }
}

fn navigation_error(url: &str, e: WebDriverError) -> SurfaceError {
    match e {
        WebDriverError::WebDriverTimeout(_) | WebDriverError::Timeout(_) => {
            SurfaceError::NavigationTimeout {
                url: url.to_string(),
            }
        }
        e => SurfaceError::WebDriver(e),
    }
}

#[async_trait]
impl RenderingSurface for Droid {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SurfaceError> {
        // The browser aborts a slow load itself, leaving the session usable.
        if self.page_load_timeout != Some(timeout) {
            self.driver.set_page_load_timeout(timeout).await?;
            self.page_load_timeout = Some(timeout);
        }

        self.driver
            .goto(url)
            .await
            .map_err(|e| navigation_error(url, e))
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, SurfaceError> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.driver.find_all(By::Css(selector)).await?.is_empty() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            time::sleep(self.poll_interval).await;
        }
    }

    async fn click_first(&mut self, selector: &str) -> Result<bool, SurfaceError> {
        match self.first(selector).await? {
            Some(element) => {
                element.click().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn scroll_to_end(&mut self, container: &str) -> Result<(), SurfaceError> {
        self.driver
            .execute(SCROLL_TO_END_JS, vec![json!(container)])
            .await?;
        Ok(())
    }

    async fn is_present(&mut self, selector: &str) -> Result<bool, SurfaceError> {
        Ok(self.first(selector).await?.is_some())
    }

    async fn is_scrolled_to_bottom(&mut self, container: &str) -> Result<bool, SurfaceError> {
        let ret = self
            .driver
            .execute(AT_BOTTOM_JS, vec![json!(container)])
            .await?;
        Ok(ret.json().as_bool().unwrap_or(false))
    }

    async fn collect_links(&mut self, selector: &str) -> Result<Vec<String>, SurfaceError> {
        let ret = self.driver.execute(HREFS_JS, vec![json!(selector)]).await?;
        serde_json::from_value(ret.json().clone()).map_err(|e| SurfaceError::Script(e.to_string()))
    }

    async fn read(&mut self, extraction: &Extraction) -> Result<Option<String>, SurfaceError> {
        match *extraction {
            Extraction::Text(selector) => match self.first(selector).await? {
                Some(element) => Ok(Some(element.text().await?)),
                None => Ok(None),
            },
            Extraction::NestedText { outer, inner } => {
                let Some(parent) = self.first(outer).await? else {
                    return Ok(None);
                };
                match parent.find_all(By::Css(inner)).await?.into_iter().next() {
                    Some(element) => Ok(Some(element.text().await?)),
                    None => Ok(None),
                }
            }
            Extraction::Href(selector) => match self.first(selector).await? {
                Some(element) => Ok(element.prop("href").await?),
                None => Ok(None),
            },
            Extraction::PageUrl => Ok(Some(self.driver.current_url().await?.to_string())),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.driver.clone().quit().await {
            log::error!("Failed to close browser session: {:?}", e);
        }
    }
}

pub struct DroidLauncher {
    settings: ScraperSettings,
}

impl DroidLauncher {
    pub fn new(settings: ScraperSettings) -> Self {
        DroidLauncher { settings }
    }
}

#[async_trait]
impl SurfaceLauncher for DroidLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderingSurface>, SurfaceError> {
        let droid = Droid::new(&self.settings).await?;
        Ok(Box::new(droid))
    }
}
