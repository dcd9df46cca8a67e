pub mod export_route;
pub mod health_route;
pub mod lead_route;
pub mod scraper_route;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::dal::StoreError;

/// Every JSON endpoint of the service, mounted under `/api`.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health_route::health)
            .service(
                web::scope("/scraper")
                    .service(scraper_route::start_scrape)
                    .service(scraper_route::job_status)
                    .service(scraper_route::list_jobs),
            )
            .service(
                web::scope("/leads")
                    .service(lead_route::list_leads)
                    .service(lead_route::insert_bulk_leads)
                    .service(lead_route::get_lead)
                    .service(lead_route::update_lead)
                    .service(lead_route::delete_lead),
            )
            .service(web::scope("/export").service(export_route::export_csv)),
    );
}

pub(crate) fn error_body(message: &str) -> serde_json::Value {
    json!({ "error": message })
}

pub(crate) fn store_error_response(e: StoreError, not_found: &str, failed: &str) -> HttpResponse {
    match e {
        StoreError::NotFound(_) => HttpResponse::NotFound().json(error_body(not_found)),
        StoreError::Database(e) => {
            log::error!("{}: {:?}", failed, e);
            HttpResponse::InternalServerError().json(error_body(failed))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use actix_web::web;

    use crate::{
        configuration::{ProberSettings, ScraperTimings},
        dal::{LeadStore, MemoryLeadStore},
        services::{
            surface::fake::{FakeLauncher, FakeSurface},
            JobOrchestrator, LeadPipeline, WebsiteProber,
        },
    };

    pub struct TestState {
        pub orchestrator: web::Data<JobOrchestrator>,
        pub store: web::Data<dyn LeadStore>,
        pub memory: Arc<MemoryLeadStore>,
    }

    pub fn test_state(surface: FakeSurface) -> TestState {
        let memory = Arc::new(MemoryLeadStore::new());
        let store: Arc<dyn LeadStore> = memory.clone();
        let prober = WebsiteProber::new(&ProberSettings {
            pause_ms: 0,
            ..Default::default()
        })
        .unwrap();
        let pipeline = LeadPipeline::new(
            Arc::new(FakeLauncher::new(surface)),
            prober,
            ScraperTimings::immediate(),
        );

        TestState {
            orchestrator: web::Data::new(JobOrchestrator::new(Arc::new(pipeline), store.clone())),
            store: web::Data::from(store),
            memory,
        }
    }
}
