use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::lead::{Lead, LeadFilter, LeadPage, LeadStatus};

use super::lead_db;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lead {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Where scraped leads live once a job finishes.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert_many(&self, leads: &[Lead]) -> Result<Vec<Lead>, StoreError>;

    /// One page of matching leads, newest first, with the total match count.
    async fn query(&self, filter: &LeadFilter) -> Result<LeadPage, StoreError>;

    /// Every matching lead, newest first.
    async fn all(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Lead, StoreError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        note: Option<&str>,
    ) -> Result<Lead, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        PgLeadStore { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn insert_many(&self, leads: &[Lead]) -> Result<Vec<Lead>, StoreError> {
        Ok(lead_db::insert_leads(&self.pool, leads).await?)
    }

    async fn query(&self, filter: &LeadFilter) -> Result<LeadPage, StoreError> {
        let total = lead_db::count_leads(&self.pool, filter).await?;
        let leads = lead_db::get_leads(&self.pool, filter, true).await?;

        Ok(LeadPage { leads, total })
    }

    async fn all(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StoreError> {
        Ok(lead_db::get_leads(&self.pool, filter, false).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Lead, StoreError> {
        lead_db::get_lead(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        note: Option<&str>,
    ) -> Result<Lead, StoreError> {
        let lead = lead_db::update_lead_status(&self.pool, id, status)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            let entry = format!("Status changed to \"{}\". {}", status.as_str(), note);
            if let Err(e) = lead_db::insert_lead_log(&self.pool, id, &entry).await {
                log::error!("Error inserting lead log for {}: {:?}", id, e);
            }
        }

        Ok(lead)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match lead_db::delete_lead(&self.pool, id).await? {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }
}
