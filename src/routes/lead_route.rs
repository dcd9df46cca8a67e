use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    dal::LeadStore,
    domain::lead::{Lead, LeadFilter, LeadStatus, NewLead},
    routes::{error_body, store_error_response},
};

#[derive(Deserialize)]
struct StatusUpdateBody {
    status: LeadStatus,
    note: Option<String>,
}

#[derive(Deserialize)]
struct BulkLeadsBody {
    leads: Vec<NewLead>,
}

#[get("")]
pub async fn list_leads(
    store: web::Data<dyn LeadStore>,
    query: web::Query<LeadFilter>,
) -> HttpResponse {
    let filter = query.into_inner();

    match store.query(&filter).await {
        Ok(page) => HttpResponse::Ok().json(json!({
            "leads": page.leads,
            "total": page.total,
            "page": filter.page(),
            "limit": filter.limit(),
        })),
        Err(e) => store_error_response(e, "Lead not found", "Failed to fetch leads"),
    }
}

#[get("/{id}")]
pub async fn get_lead(store: web::Data<dyn LeadStore>, path: web::Path<Uuid>) -> HttpResponse {
    match store.get(path.into_inner()).await {
        Ok(lead) => HttpResponse::Ok().json(lead),
        Err(e) => store_error_response(e, "Lead not found", "Failed to fetch lead"),
    }
}

#[patch("/{id}")]
pub async fn update_lead(
    store: web::Data<dyn LeadStore>,
    path: web::Path<Uuid>,
    body: web::Json<StatusUpdateBody>,
) -> HttpResponse {
    let body = body.into_inner();

    match store
        .update_status(path.into_inner(), body.status, body.note.as_deref())
        .await
    {
        Ok(lead) => HttpResponse::Ok().json(lead),
        Err(e) => store_error_response(e, "Lead not found", "Failed to update lead"),
    }
}

#[delete("/{id}")]
pub async fn delete_lead(store: web::Data<dyn LeadStore>, path: web::Path<Uuid>) -> HttpResponse {
    match store.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Lead deleted" })),
        Err(e) => store_error_response(e, "Lead not found", "Failed to delete lead"),
    }
}

#[post("/bulk")]
pub async fn insert_bulk_leads(
    store: web::Data<dyn LeadStore>,
    body: web::Json<BulkLeadsBody>,
) -> HttpResponse {
    let leads: Vec<Lead> = body
        .into_inner()
        .leads
        .into_iter()
        .filter(|l| !l.company_name.trim().is_empty())
        .map(Lead::from)
        .collect();

    if leads.is_empty() {
        return HttpResponse::BadRequest().json(error_body("No leads to insert"));
    }

    match store.insert_many(&leads).await {
        Ok(inserted) => HttpResponse::Ok().json(json!({
            "inserted": inserted.len(),
            "leads": inserted,
        })),
        Err(e) => store_error_response(e, "Lead not found", "Failed to insert leads"),
    }
}
