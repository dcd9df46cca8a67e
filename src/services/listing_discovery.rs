use std::collections::HashSet;

use tokio::time;
use url::form_urlencoded;

use crate::{configuration::ScraperTimings, error::ScrapeError, services::RenderingSurface};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
pub const FEED_SELECTOR: &str = r#"[role="feed"]"#;
pub const LISTING_ANCHOR_SELECTOR: &str = r#"a[href*="/maps/place/"]"#;
const FEED_ANCHOR_SELECTOR: &str = r#"[role="feed"] a[href*="/maps/place/"]"#;
const CONSENT_SELECTOR: &str = r#"button[aria-label*="Accept"], button[aria-label*="Terima"], form[action*="consent"] button"#;
const END_OF_LIST_SELECTORS: [&str; 2] = ["p.fontBodyMedium > span > span", "div.PbZDve"];

const MIN_SCROLL_ATTEMPTS: u32 = 15;
// The feed loads roughly this many listings per scroll.
const LISTINGS_PER_SCROLL: u32 = 6;
const MAX_STUCK_SCROLLS: u32 = 3;

pub fn max_scroll_attempts(max_results: u32) -> u32 {
    MIN_SCROLL_ATTEMPTS.max(max_results.div_ceil(LISTINGS_PER_SCROLL))
}

pub fn build_maps_search_url(search_query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(search_query.as_bytes()).collect();
    format!("{}{}", MAPS_SEARCH_URL, encoded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollObservation {
    pub count: usize,
    pub end_marker: bool,
    pub at_bottom: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollVerdict {
    Continue,
    /// Nothing new loaded; pause a little longer before the next scroll.
    RetryAfterDelay,
    ReachedTarget,
    EndOfList,
    Stuck,
}

impl ScrollVerdict {
    pub fn is_done(&self) -> bool {
        !matches!(self, ScrollVerdict::Continue | ScrollVerdict::RetryAfterDelay)
    }
}

/// Decides after each scroll whether the feed is worth scrolling again.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    max_results: usize,
    max_attempts: u32,
    attempts: u32,
    previous_count: usize,
    stuck: u32,
}

impl ScrollTracker {
    pub fn new(max_results: u32) -> Self {
        ScrollTracker {
            max_results: max_results as usize,
            max_attempts: max_scroll_attempts(max_results),
            attempts: 0,
            previous_count: 0,
            stuck: 0,
        }
    }

    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn observe(&mut self, observation: ScrollObservation) -> ScrollVerdict {
        self.attempts += 1;

        if observation.count >= self.max_results {
            return ScrollVerdict::ReachedTarget;
        }

        // An end marker only ends the list once the feed stops growing.
        let verdict = match observation.count == self.previous_count {
            true if observation.end_marker || observation.at_bottom => ScrollVerdict::EndOfList,
            true => {
                self.stuck += 1;
                match self.stuck >= MAX_STUCK_SCROLLS {
                    true => ScrollVerdict::Stuck,
                    false => ScrollVerdict::RetryAfterDelay,
                }
            }
            false => {
                self.stuck = 0;
                ScrollVerdict::Continue
            }
        };
        self.previous_count = observation.count;
        verdict
    }
}

/// First-seen order, duplicates dropped, then cut to `max_results`.
pub fn unique_listing_refs(links: Vec<String>, max_results: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .take(max_results)
        .collect()
}

pub async fn discover_listings(
    surface: &mut dyn RenderingSurface,
    search_query: &str,
    max_results: u32,
    timings: &ScraperTimings,
) -> Result<Vec<String>, ScrapeError> {
    let search_query = search_query.trim();
    if search_query.is_empty() {
        return Err(ScrapeError::EmptyQuery);
    }

    let url = build_maps_search_url(search_query);
    log::info!("Navigating to: {}", url);
    surface.navigate(&url, timings.navigation_timeout()).await?;

    dismiss_consent(surface, timings).await;

    let feed_found = surface
        .wait_for(FEED_SELECTOR, timings.feed_timeout())
        .await?;
    if !feed_found {
        log::warn!("Feed selector not found, looking for listing anchors instead");
        let anchors_found = surface
            .wait_for(LISTING_ANCHOR_SELECTOR, timings.anchor_fallback_timeout())
            .await?;
        if !anchors_found {
            return Err(ScrapeError::DiscoveryUnavailable {
                query: search_query.to_string(),
            });
        }
    }

    let anchor_selector = match feed_found {
        true => {
            scroll_feed(surface, max_results, timings).await?;
            FEED_ANCHOR_SELECTOR
        }
        false => LISTING_ANCHOR_SELECTOR,
    };

    let links = surface.collect_links(anchor_selector).await?;
    let listing_refs = unique_listing_refs(links, max_results as usize);
    log::info!(
        "Found {} unique listings for {:?}",
        listing_refs.len(),
        search_query
    );

    Ok(listing_refs)
}

async fn dismiss_consent(surface: &mut dyn RenderingSurface, timings: &ScraperTimings) {
    match surface.click_first(CONSENT_SELECTOR).await {
        Ok(true) => {
            log::info!("Accepted cookie consent");
            time::sleep(timings.consent_pause()).await;
        }
        Ok(false) => {}
        Err(e) => log::debug!("Consent dialog could not be dismissed: {}", e),
    }
}

async fn scroll_feed(
    surface: &mut dyn RenderingSurface,
    max_results: u32,
    timings: &ScraperTimings,
) -> Result<(), ScrapeError> {
    let mut tracker = ScrollTracker::new(max_results);

    while tracker.has_attempts_left() {
        surface.scroll_to_end(FEED_SELECTOR).await?;
        time::sleep(timings.scroll_pause()).await;

        let count = surface
            .collect_links(FEED_ANCHOR_SELECTOR)
            .await?
            .into_iter()
            .collect::<HashSet<_>>()
            .len();
        let end_marker = end_marker_present(surface).await?;
        let at_bottom = surface.is_scrolled_to_bottom(FEED_SELECTOR).await?;

        let verdict = tracker.observe(ScrollObservation {
            count,
            end_marker,
            at_bottom,
        });
        log::info!(
            "Scroll {}: {} listings loaded ({:?})",
            tracker.attempts(),
            count,
            verdict
        );

        match verdict {
            ScrollVerdict::RetryAfterDelay => time::sleep(timings.stuck_retry_pause()).await,
            verdict if verdict.is_done() => break,
            _ => {}
        }
    }

    Ok(())
}

async fn end_marker_present(surface: &mut dyn RenderingSurface) -> Result<bool, ScrapeError> {
    for selector in END_OF_LIST_SELECTORS {
        if surface.is_present(selector).await? {
            return Ok(true);
        }
    }
    Ok(false)
}
