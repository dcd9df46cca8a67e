use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    dal::LeadStore,
    domain::{
        job::{Job, JobSummary, ScrapeQuery},
        lead::Lead,
    },
    error::ScrapeError,
    services::{validate_query, LeadPipeline},
};

/// Runs scrape jobs in the background and keeps every job's record in memory for
/// the life of the process. Job ids mean nothing to another process.
#[derive(Clone)]
pub struct JobOrchestrator {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    pipeline: Arc<LeadPipeline>,
    store: Arc<dyn LeadStore>,
}

impl JobOrchestrator {
    pub fn new(pipeline: Arc<LeadPipeline>, store: Arc<dyn LeadStore>) -> Self {
        JobOrchestrator {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            pipeline,
            store,
        }
    }

    /// Registers a running job and returns its id without waiting for the scrape.
    pub async fn start(&self, query: ScrapeQuery) -> Result<Uuid, ScrapeError> {
        validate_query(&query)?;

        let job = Job::start(query.clone());
        let job_id = job.id;
        self.jobs.write().await.insert(job_id, job);
        log::info!(
            "Started job {} for {:?} (max {})",
            job_id,
            query.search_query(),
            query.max_results
        );

        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.execute(job_id, query).await });

        Ok(job_id)
    }

    pub async fn status(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    pub async fn list(&self) -> Vec<JobSummary> {
        let mut summaries: Vec<JobSummary> =
            self.jobs.read().await.values().map(Job::summary).collect();
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    async fn execute(self, job_id: Uuid, query: ScrapeQuery) {
        // The pipeline gets its own task so a panic inside it still fails the job.
        let pipeline = self.pipeline.clone();
        let run = tokio::spawn(async move { pipeline.run(&query).await });

        let outcome = match run.await {
            Ok(Ok(leads)) => Ok(leads),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("Scraping task aborted: {}", e)),
        };

        match outcome {
            Ok(leads) => self.complete(job_id, leads).await,
            Err(message) => {
                log::error!("Job {} failed: {}", job_id, message);
                self.transition(job_id, |job| job.fail(message)).await;
            }
        }
    }

    async fn complete(&self, job_id: Uuid, leads: Vec<Lead>) {
        let (results, persistence_error) = match self.store.insert_many(&leads).await {
            Ok(stored) => (stored, None),
            Err(e) => {
                log::error!("DB insert error for job {}: {:?}", job_id, e);
                (leads, Some(format!("Leads were scraped but not saved: {}", e)))
            }
        };

        let count = results.len();
        self.transition(job_id, |job| job.complete(results, persistence_error))
            .await;
        log::info!("Job {} completed with {} leads", job_id, count);
    }

    async fn transition(&self, job_id: Uuid, apply: impl FnOnce(&mut Job) -> bool) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) => {
                if !apply(job) {
                    log::error!("Job {} was already {:?}", job_id, job.state);
                }
            }
            None => log::error!("Job {} vanished from the job table", job_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        configuration::{ProberSettings, ScraperTimings},
        dal::{MemoryLeadStore, StoreError},
        domain::{
            job::JobState,
            lead::{LeadFilter, LeadPage, LeadStatus},
        },
        error::SurfaceError,
        services::{
            detail_extractor::CATEGORY_CHAIN,
            surface::fake::{FakeLauncher, FakeListing, FakeSurface},
            RenderingSurface, SurfaceLauncher, WebsiteProber,
        },
    };

    struct BrokenStore;

    #[async_trait]
    impl LeadStore for BrokenStore {
        async fn insert_many(&self, _leads: &[Lead]) -> Result<Vec<Lead>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn query(&self, _filter: &LeadFilter) -> Result<LeadPage, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn all(&self, _filter: &LeadFilter) -> Result<Vec<Lead>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn get(&self, id: Uuid) -> Result<Lead, StoreError> {
            Err(StoreError::NotFound(id))
        }

        async fn update_status(
            &self,
            id: Uuid,
            _status: LeadStatus,
            _note: Option<&str>,
        ) -> Result<Lead, StoreError> {
            Err(StoreError::NotFound(id))
        }

        async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::NotFound(id))
        }
    }

    struct PanickingLauncher;

    #[async_trait]
    impl SurfaceLauncher for PanickingLauncher {
        async fn launch(&self) -> Result<Box<dyn RenderingSurface>, SurfaceError> {
            panic!("chromedriver crashed");
        }
    }

    fn orchestrator(launcher: Arc<dyn SurfaceLauncher>, store: Arc<dyn LeadStore>) -> JobOrchestrator {
        let prober = WebsiteProber::new(&ProberSettings {
            pause_ms: 0,
            ..Default::default()
        })
        .unwrap();
        let pipeline = LeadPipeline::new(launcher, prober, ScraperTimings::immediate());
        JobOrchestrator::new(Arc::new(pipeline), store)
    }

    fn three_listings_one_duplicate() -> FakeSurface {
        FakeSurface::with_feed(vec![vec!["A", "B", "C"]])
            .listing("A", FakeListing::named("Kopi Kenangan"))
            .listing("B", FakeListing::named("Kopi Kenangan"))
            .listing("C", FakeListing::default().with(CATEGORY_CHAIN[0], "Cafe"))
    }

    async fn wait_until_finished(orchestrator: &JobOrchestrator, job_id: Uuid) -> Job {
        for _ in 0..500 {
            let job = orchestrator.status(job_id).await.unwrap();
            if job.state.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never finished", job_id);
    }

    #[tokio::test]
    async fn job_runs_in_background_and_completes_with_unique_leads() {
        let store = Arc::new(MemoryLeadStore::new());
        let orchestrator = orchestrator(
            Arc::new(FakeLauncher::new(three_listings_one_duplicate())),
            store.clone(),
        );

        let job_id = orchestrator
            .start(ScrapeQuery::new("Cafe", "Malang", 3))
            .await
            .unwrap();
        assert_eq!(
            orchestrator.status(job_id).await.unwrap().state,
            JobState::Running
        );

        let job = wait_until_finished(&orchestrator, job_id).await;

        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.results.len(), 1);
        assert_eq!(job.results[0].company_name, "Kopi Kenangan");
        assert!(job.error.is_none());
        assert!(job.persistence_error.is_none());
        assert!(job.finished_at.is_some());
        assert_eq!(store.query(&LeadFilter::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn job_fails_when_results_never_load() {
        let orchestrator = orchestrator(
            Arc::new(FakeLauncher::new(FakeSurface::default())),
            Arc::new(MemoryLeadStore::new()),
        );

        let job_id = orchestrator
            .start(ScrapeQuery::new("Cafe", "Malang", 3))
            .await
            .unwrap();
        let job = wait_until_finished(&orchestrator, job_id).await;

        assert_eq!(job.state, JobState::Failed);
        assert!(job.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert!(job.results.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_still_completes_the_job() {
        let orchestrator = orchestrator(
            Arc::new(FakeLauncher::new(three_listings_one_duplicate())),
            Arc::new(BrokenStore),
        );

        let job_id = orchestrator
            .start(ScrapeQuery::new("Cafe", "Malang", 3))
            .await
            .unwrap();
        let job = wait_until_finished(&orchestrator, job_id).await;

        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.results.len(), 1);
        assert!(job.persistence_error.is_some());
    }

    #[tokio::test]
    async fn panicking_pipeline_fails_the_job() {
        let orchestrator = orchestrator(Arc::new(PanickingLauncher), Arc::new(MemoryLeadStore::new()));

        let job_id = orchestrator
            .start(ScrapeQuery::new("Cafe", "Malang", 3))
            .await
            .unwrap();
        let job = wait_until_finished(&orchestrator, job_id).await;

        assert_eq!(job.state, JobState::Failed);
        assert!(job.error.unwrap().starts_with("Scraping task aborted"));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_a_job() {
        let orchestrator = orchestrator(
            Arc::new(FakeLauncher::new(FakeSurface::default())),
            Arc::new(MemoryLeadStore::new()),
        );

        let result = orchestrator.start(ScrapeQuery::new(" ", "Malang", 3)).await;

        assert!(matches!(result, Err(ScrapeError::EmptyQuery)));
        assert!(orchestrator.list().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_job_is_not_found_and_list_omits_results() {
        let orchestrator = orchestrator(
            Arc::new(FakeLauncher::new(three_listings_one_duplicate())),
            Arc::new(MemoryLeadStore::new()),
        );
        assert!(orchestrator.status(Uuid::new_v4()).await.is_none());

        let first = orchestrator
            .start(ScrapeQuery::new("Cafe", "Malang", 3))
            .await
            .unwrap();
        let second = orchestrator
            .start(ScrapeQuery::new("Cafe", "Batu", 3))
            .await
            .unwrap();
        wait_until_finished(&orchestrator, first).await;
        wait_until_finished(&orchestrator, second).await;

        let summaries = orchestrator.list().await;
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.result_count == 1));
    }
}
