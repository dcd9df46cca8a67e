use super::lead::WebsiteStatus;

/// Fields read off one listing's detail page, before deduplication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetails {
    pub company_name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub website_url: Option<String>,
    pub source_url: String,
}

impl ListingDetails {
    /// Placeholder until the batch probe runs: `active` when a URL was found.
    pub fn provisional_website_status(&self) -> WebsiteStatus {
        match self.website_url {
            Some(_) => WebsiteStatus::Active,
            None => WebsiteStatus::None,
        }
    }
}
