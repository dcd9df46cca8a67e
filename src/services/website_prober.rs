use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    configuration::ProberSettings,
    domain::lead::{Lead, WebsiteStatus},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub status: WebsiteStatus,
    pub status_code: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteCheck {
    pub lead_id: Uuid,
    pub website_url: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

/// Schemeless URLs are assumed to be https.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    match url.starts_with("http://") || url.starts_with("https://") {
        true => url.to_string(),
        false => format!("https://{}", url),
    }
}

pub fn classify_status(status: StatusCode) -> ProbeOutcome {
    let code = status.as_u16();
    match status.is_success() || matches!(code, 301 | 302) {
        true => ProbeOutcome {
            status: WebsiteStatus::Active,
            status_code: Some(code),
            message: format!("Website is reachable (HTTP {})", code),
        },
        false => ProbeOutcome {
            status: WebsiteStatus::Dead,
            status_code: Some(code),
            message: format!("Website returned HTTP {}", code),
        },
    }
}

/// Checks whether lead websites still answer. Never returns an error: every
/// failure is reported as a `dead` outcome.
pub struct WebsiteProber {
    client: Client,
    timeout: Duration,
    pause: Duration,
}

impl WebsiteProber {
    pub fn new(settings: &ProberSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(&settings.user_agent).build()?;

        Ok(WebsiteProber {
            client,
            timeout: settings.timeout(),
            pause: settings.pause(),
        })
    }

    pub async fn probe(&self, url: Option<&str>) -> ProbeOutcome {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return ProbeOutcome {
                status: WebsiteStatus::None,
                status_code: None,
                message: "No URL provided".to_string(),
            };
        };

        let url = normalize_url(url);
        match self.client.head(&url).timeout(self.timeout).send().await {
            Ok(res) => classify_status(res.status()),
            Err(e) if e.is_timeout() => ProbeOutcome {
                status: WebsiteStatus::Dead,
                status_code: None,
                message: "Request timed out".to_string(),
            },
            Err(e) => {
                log::debug!("Probe of {} failed: {:?}", url, e);
                ProbeOutcome {
                    status: WebsiteStatus::Dead,
                    status_code: None,
                    message: format!("Connection failed: {}", e),
                }
            }
        }
    }

    /// Probes one lead at a time with a fixed pause in between. Leads without a
    /// website are skipped.
    pub async fn batch_probe(&self, leads: &[Lead]) -> Vec<WebsiteCheck> {
        let mut checks = vec![];

        for lead in leads {
            let Some(website_url) = lead.website_url.as_deref() else {
                continue;
            };
            if !checks.is_empty() {
                tokio::time::sleep(self.pause).await;
            }

            let outcome = self.probe(Some(website_url)).await;
            log::info!("{} -> {}", website_url, outcome.message);
            checks.push(WebsiteCheck {
                lead_id: lead.id,
                website_url: website_url.to_string(),
                outcome,
            });
        }

        checks
    }
}
