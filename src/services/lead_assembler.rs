use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    lead::{Lead, LeadStatus},
    listing::ListingDetails,
};

/// Turns extracted listings into leads, keeping the first listing seen for each
/// exact company name.
pub struct LeadAssembler {
    keyword: String,
    seen_names: HashSet<String>,
    leads: Vec<Lead>,
}

impl LeadAssembler {
    pub fn new(keyword: &str) -> Self {
        LeadAssembler {
            keyword: keyword.trim().to_string(),
            seen_names: HashSet::new(),
            leads: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Returns the accepted lead, or `None` for nameless and duplicate listings.
    pub fn accept(&mut self, details: ListingDetails) -> Option<&Lead> {
        let website_status = details.provisional_website_status();

        let company_name = details.company_name.filter(|n| !n.trim().is_empty())?;
        if !self.seen_names.insert(company_name.clone()) {
            log::info!("Duplicate: {}, skipping", company_name);
            return None;
        }

        let category = details
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.keyword.clone());

        self.leads.push(Lead {
            id: Uuid::new_v4(),
            company_name,
            category,
            address: details.address,
            phone_number: details.phone_number,
            website_url: details.website_url,
            website_status,
            source_url: details.source_url,
            status: LeadStatus::New,
            scraped_at: Utc::now(),
        });
        self.leads.last()
    }

    pub fn finish(self) -> Vec<Lead> {
        self.leads
    }
}
