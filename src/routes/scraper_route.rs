use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use serde_json::json;
use uuid::Uuid;

use crate::{
    domain::job::{ScrapeQuery, DEFAULT_MAX_RESULTS},
    routes::error_body,
    services::JobOrchestrator,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartScrapeBody {
    keyword: Option<String>,
    location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    max_results: Option<u32>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[post("/start")]
pub async fn start_scrape(
    orchestrator: web::Data<JobOrchestrator>,
    body: web::Json<StartScrapeBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let (Some(keyword), Some(location)) = (non_blank(body.keyword), non_blank(body.location))
    else {
        return HttpResponse::BadRequest().json(error_body("keyword and location are required"));
    };

    let query = ScrapeQuery::new(
        keyword,
        location,
        body.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
    );

    match orchestrator.start(query).await {
        Ok(job_id) => HttpResponse::Ok().json(json!({
            "jobId": job_id,
            "message": "Scraping started",
        })),
        Err(e) => HttpResponse::BadRequest().json(error_body(&e.to_string())),
    }
}

#[get("/status/{job_id}")]
pub async fn job_status(
    orchestrator: web::Data<JobOrchestrator>,
    path: web::Path<String>,
) -> HttpResponse {
    let job = match Uuid::parse_str(&path) {
        Ok(job_id) => orchestrator.status(job_id).await,
        Err(_) => None,
    };

    match job {
        Some(job) => HttpResponse::Ok().json(job),
        None => HttpResponse::NotFound().json(error_body("Job not found")),
    }
}

#[get("/jobs")]
pub async fn list_jobs(orchestrator: web::Data<JobOrchestrator>) -> HttpResponse {
    HttpResponse::Ok().json(orchestrator.list().await)
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};

    use super::*;
    use crate::{
        routes::{api_routes, testing::test_state},
        services::surface::fake::{FakeListing, FakeSurface},
    };

    fn one_cafe() -> FakeSurface {
        FakeSurface::with_feed(vec![vec!["https://maps.test/place/a"]])
            .listing("https://maps.test/place/a", FakeListing::named("Kopi Tuku"))
    }

    #[actix_web::test]
    async fn start_requires_keyword_and_location() {
        let state = test_state(one_cafe());
        let app = test::init_service(
            App::new()
                .app_data(state.orchestrator.clone())
                .app_data(state.store.clone())
                .configure(api_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/scraper/start")
            .set_json(json!({ "keyword": "  ", "location": "Bandung" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.orchestrator.list().await.is_empty());
    }

    #[actix_web::test]
    async fn started_job_is_visible_in_status_and_list() {
        let state = test_state(one_cafe());
        let app = test::init_service(
            App::new()
                .app_data(state.orchestrator.clone())
                .app_data(state.store.clone())
                .configure(api_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/scraper/start")
            .set_json(json!({ "keyword": "Cafe", "location": "Bandung", "maxResults": 5 }))
            .to_request();
        let started: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let job_id = started["jobId"].as_str().unwrap().to_string();
        assert_eq!(started["message"], "Scraping started");

        let req = test::TestRequest::get()
            .uri(&format!("/api/scraper/status/{}", job_id))
            .to_request();
        let job: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(job["id"], job_id.as_str());
        assert_eq!(job["query"]["keyword"], "Cafe");

        let req = test::TestRequest::get().uri("/api/scraper/jobs").to_request();
        let jobs: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(jobs.as_array().unwrap().len(), 1);
        assert_eq!(jobs[0]["id"], job_id.as_str());
    }

    #[actix_web::test]
    async fn max_results_may_be_sent_as_a_string() {
        let state = test_state(one_cafe());
        let app = test::init_service(
            App::new()
                .app_data(state.orchestrator.clone())
                .app_data(state.store.clone())
                .configure(api_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/scraper/start")
            .set_json(json!({ "keyword": "Cafe", "location": "Bandung", "maxResults": "7" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let started: serde_json::Value = test::read_body_json(resp).await;
        let job_id = Uuid::parse_str(started["jobId"].as_str().unwrap()).unwrap();
        let job = state.orchestrator.status(job_id).await.unwrap();
        assert_eq!(job.query.max_results, 7);
    }

    #[actix_web::test]
    async fn unknown_job_is_not_found() {
        let state = test_state(one_cafe());
        let app = test::init_service(
            App::new()
                .app_data(state.orchestrator.clone())
                .app_data(state.store.clone())
                .configure(api_routes),
        )
        .await;

        for id in [Uuid::new_v4().to_string(), "not-a-job".to_string()] {
            let req = test::TestRequest::get()
                .uri(&format!("/api/scraper/status/{}", id))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Job not found");
        }
    }
}
