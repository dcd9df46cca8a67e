use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    configuration::ScraperTimings,
    domain::{job::ScrapeQuery, lead::Lead},
    error::ScrapeError,
    services::{
        discover_listings, extract_listing, LeadAssembler, RenderingSurface, SurfaceLauncher,
        WebsiteCheck, WebsiteProber,
    },
};

pub fn validate_query(query: &ScrapeQuery) -> Result<(), ScrapeError> {
    if query.keyword.trim().is_empty() || query.location.trim().is_empty() {
        return Err(ScrapeError::EmptyQuery);
    }
    if query.max_results == 0 {
        return Err(ScrapeError::InvalidMaxResults);
    }
    Ok(())
}

/// Replaces each probed lead's provisional website status with the probe result.
pub fn apply_checks(leads: &mut [Lead], checks: &[WebsiteCheck]) {
    let by_lead: HashMap<Uuid, &WebsiteCheck> = checks.iter().map(|c| (c.lead_id, c)).collect();
    for lead in leads.iter_mut() {
        if let Some(check) = by_lead.get(&lead.id) {
            lead.website_status = check.outcome.status;
        }
    }
}

/// Discovery, extraction, deduplication and website probing for one search,
/// all on a single browser session.
pub struct LeadPipeline {
    launcher: Arc<dyn SurfaceLauncher>,
    prober: WebsiteProber,
    timings: ScraperTimings,
}

impl LeadPipeline {
    pub fn new(
        launcher: Arc<dyn SurfaceLauncher>,
        prober: WebsiteProber,
        timings: ScraperTimings,
    ) -> Self {
        LeadPipeline {
            launcher,
            prober,
            timings,
        }
    }

    pub async fn run(&self, query: &ScrapeQuery) -> Result<Vec<Lead>, ScrapeError> {
        validate_query(query)?;

        let mut surface = self.launcher.launch().await.map_err(ScrapeError::Launch)?;
        let scraped = self.scrape(surface.as_mut(), query).await;
        surface.close().await;
        let mut leads = scraped?;

        let with_websites = leads.iter().filter(|l| l.website_url.is_some()).count();
        if with_websites > 0 {
            log::info!("Checking {} website statuses...", with_websites);
            let checks = self.prober.batch_probe(&leads).await;
            apply_checks(&mut leads, &checks);
        }

        log::info!(
            "Scraping complete for {:?}. Total unique results: {}",
            query.search_query(),
            leads.len()
        );
        Ok(leads)
    }

    async fn scrape(
        &self,
        surface: &mut dyn RenderingSurface,
        query: &ScrapeQuery,
    ) -> Result<Vec<Lead>, ScrapeError> {
        let listing_refs = discover_listings(
            surface,
            &query.search_query(),
            query.max_results,
            &self.timings,
        )
        .await?;

        let total = listing_refs.len();
        let mut assembler = LeadAssembler::new(&query.keyword);

        for (i, listing_ref) in listing_refs.iter().enumerate() {
            match extract_listing(surface, listing_ref, &self.timings).await {
                Ok(details) => {
                    if let Some(lead) = assembler.accept(details) {
                        log::info!("[{}/{}] {}", i + 1, total, lead.company_name);
                    }
                }
                Err(e) => log::warn!("Skipping listing {}: {}", i + 1, e),
            }
        }

        Ok(assembler.finish())
    }
}
