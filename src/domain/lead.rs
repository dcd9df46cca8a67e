use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_PAGE_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "website_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WebsiteStatus {
    Active,
    Dead,
    None,
}

impl WebsiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebsiteStatus::Active => "active",
            WebsiteStatus::Dead => "dead",
            WebsiteStatus::None => "none",
        }
    }
}

/// Sales disposition of a lead. Only the record store changes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Interested,
    Closing,
    Rejected,
    Closed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Interested => "interested",
            LeadStatus::Closing => "closing",
            LeadStatus::Rejected => "rejected",
            LeadStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub company_name: String,
    pub category: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub website_url: Option<String>,
    pub website_status: WebsiteStatus,
    #[serde(rename = "google_maps_url")]
    #[sqlx(rename = "google_maps_url")]
    pub source_url: String,
    pub status: LeadStatus,
    pub scraped_at: DateTime<Utc>,
}

/// A lead supplied by a client for bulk import. Missing fields take the
/// same defaults a freshly scraped lead gets.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    pub company_name: String,
    #[serde(default)]
    pub category: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub website_url: Option<String>,
    pub website_status: Option<WebsiteStatus>,
    #[serde(default)]
    pub google_maps_url: String,
    pub status: Option<LeadStatus>,
    pub scraped_at: Option<DateTime<Utc>>,
}

impl From<NewLead> for Lead {
    fn from(new: NewLead) -> Self {
        let website_status = new.website_status.unwrap_or(match new.website_url {
            Some(_) => WebsiteStatus::Active,
            None => WebsiteStatus::None,
        });

        Lead {
            id: Uuid::new_v4(),
            company_name: new.company_name.trim().to_string(),
            category: new.category,
            address: new.address,
            phone_number: new.phone_number,
            website_url: new.website_url,
            website_status,
            source_url: new.google_maps_url,
            status: new.status.unwrap_or_default(),
            scraped_at: new.scraped_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Keeps digits, `+`, `-`, whitespace and parentheses, then trims.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '(' | ')'))
        .collect();

    let cleaned = cleaned.trim();
    match cleaned.is_empty() {
        true => None,
        false => Some(cleaned.to_string()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub website_status: Option<WebsiteStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl LeadFilter {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1)
    }

    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.limit()
    }

    /// In-process equivalent of the SQL `where` clause built by the postgres store.
    pub fn matches(&self, lead: &Lead) -> bool {
        if self.status.is_some_and(|s| s != lead.status) {
            return false;
        }
        if self.website_status.is_some_and(|s| s != lead.website_status) {
            return false;
        }
        if let Some(category) = non_blank(&self.category) {
            if !contains_ignore_case(&lead.category, category) {
                return false;
            }
        }
        if let Some(search) = non_blank(&self.search) {
            let in_name = contains_ignore_case(&lead.company_name, search);
            let in_address = lead
                .address
                .as_deref()
                .is_some_and(|a| contains_ignore_case(a, search));
            if !in_name && !in_address {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub total: i64,
}
