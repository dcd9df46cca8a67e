use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::lead::{Lead, LeadFilter, LeadPage, LeadStatus};

use super::{LeadStore, StoreError};

#[derive(Debug, Clone)]
pub struct LeadNote {
    pub lead_id: Uuid,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Process-local store used when no database is configured. Contents are lost
/// on restart.
#[derive(Default)]
pub struct MemoryLeadStore {
    leads: RwLock<Vec<Lead>>,
    notes: RwLock<Vec<LeadNote>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notes_for(&self, lead_id: Uuid) -> Vec<LeadNote> {
        self.notes
            .read()
            .await
            .iter()
            .filter(|n| n.lead_id == lead_id)
            .cloned()
            .collect()
    }

    async fn matching(&self, filter: &LeadFilter) -> Vec<Lead> {
        let mut leads: Vec<Lead> = self
            .leads
            .read()
            .await
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        leads.sort_by_key(|l| Reverse(l.scraped_at));
        leads
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn insert_many(&self, leads: &[Lead]) -> Result<Vec<Lead>, StoreError> {
        self.leads.write().await.extend_from_slice(leads);
        Ok(leads.to_vec())
    }

    async fn query(&self, filter: &LeadFilter) -> Result<LeadPage, StoreError> {
        let matching = self.matching(filter).await;
        let total = matching.len() as i64;
        let leads = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect();

        Ok(LeadPage { leads, total })
    }

    async fn all(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StoreError> {
        Ok(self.matching(filter).await)
    }

    async fn get(&self, id: Uuid) -> Result<Lead, StoreError> {
        self.leads
            .read()
            .await
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        note: Option<&str>,
    ) -> Result<Lead, StoreError> {
        let updated = {
            let mut leads = self.leads.write().await;
            let lead = leads
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or(StoreError::NotFound(id))?;
            lead.status = status;
            lead.clone()
        };

        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            self.notes.write().await.push(LeadNote {
                lead_id: id,
                note: format!("Status changed to \"{}\". {}", status.as_str(), note),
                created_at: Utc::now(),
            });
        }

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut leads = self.leads.write().await;
        let before = leads.len();
        leads.retain(|l| l.id != id);

        match leads.len() == before {
            true => Err(StoreError::NotFound(id)),
            false => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::lead::WebsiteStatus;

    fn lead(name: &str, minutes_ago: i64, website_status: WebsiteStatus) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            company_name: name.to_string(),
            category: "Bengkel Las".to_string(),
            address: Some("Surabaya".to_string()),
            phone_number: None,
            website_url: None,
            website_status,
            source_url: format!("https://www.google.com/maps/place/{}", name),
            status: LeadStatus::New,
            scraped_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn query_pages_newest_first() {
        let store = MemoryLeadStore::new();
        store
            .insert_many(&[
                lead("Old", 30, WebsiteStatus::None),
                lead("Newest", 1, WebsiteStatus::Active),
                lead("Middle", 10, WebsiteStatus::Dead),
            ])
            .await
            .unwrap();

        let page = store
            .query(&LeadFilter {
                page: Some(1),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        let names: Vec<&str> = page.leads.iter().map(|l| l.company_name.as_str()).collect();
        assert_eq!(names, vec!["Newest", "Middle"]);

        let dead = store
            .all(&LeadFilter {
                website_status: Some(WebsiteStatus::Dead),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].company_name, "Middle");
    }

    #[tokio::test]
    async fn update_status_records_a_note() {
        let store = MemoryLeadStore::new();
        let stored = store
            .insert_many(&[lead("Las Jaya", 0, WebsiteStatus::None)])
            .await
            .unwrap();
        let id = stored[0].id;

        let updated = store
            .update_status(id, LeadStatus::Contacted, Some("Called the owner"))
            .await
            .unwrap();

        assert_eq!(updated.status, LeadStatus::Contacted);
        assert_eq!(store.get(id).await.unwrap().status, LeadStatus::Contacted);
        let notes = store.notes_for(id).await;
        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes[0].note,
            "Status changed to \"contacted\". Called the owner"
        );
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemoryLeadStore::new();
        let id = Uuid::new_v4();

        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update_status(id, LeadStatus::Closed, None).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_the_lead() {
        let store = MemoryLeadStore::new();
        let stored = store
            .insert_many(&[lead("Las Jaya", 0, WebsiteStatus::None)])
            .await
            .unwrap();

        store.delete(stored[0].id).await.unwrap();

        assert_eq!(store.query(&LeadFilter::default()).await.unwrap().total, 0);
    }
}
