use actix_web::{get, http::header, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    dal::LeadStore,
    domain::lead::{Lead, LeadFilter, LeadStatus, WebsiteStatus},
    routes::{error_body, store_error_response},
};

const UTF8_BOM: &str = "\u{FEFF}";

const CSV_HEADERS: [&str; 9] = [
    "Nama Bisnis",
    "Kategori",
    "Alamat",
    "No. Telepon",
    "Website",
    "Status Website",
    "Google Maps",
    "Status Prospek",
    "Tanggal Scraping",
];

#[derive(Deserialize)]
struct ExportQuery {
    status: Option<LeadStatus>,
    website_status: Option<WebsiteStatus>,
}

/// Spreadsheet-friendly CSV: BOM-prefixed so Excel picks up UTF-8.
pub fn leads_to_csv(leads: &[Lead]) -> Result<String, anyhow::Error> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADERS)?;

    for lead in leads {
        let scraped_at = lead.scraped_at.format("%Y-%m-%d %H:%M:%S").to_string();
        writer.write_record([
            lead.company_name.as_str(),
            lead.category.as_str(),
            lead.address.as_deref().unwrap_or(""),
            lead.phone_number.as_deref().unwrap_or(""),
            lead.website_url.as_deref().unwrap_or(""),
            lead.website_status.as_str(),
            lead.source_url.as_str(),
            lead.status.as_str(),
            scraped_at.as_str(),
        ])?;
    }

    let bytes = writer.into_inner()?;
    Ok(format!("{}{}", UTF8_BOM, String::from_utf8(bytes)?))
}

#[get("/csv")]
pub async fn export_csv(
    store: web::Data<dyn LeadStore>,
    query: web::Query<ExportQuery>,
) -> HttpResponse {
    let query = query.into_inner();
    let filter = LeadFilter {
        status: query.status,
        website_status: query.website_status,
        ..Default::default()
    };

    let leads = match store.all(&filter).await {
        Ok(leads) => leads,
        Err(e) => return store_error_response(e, "No leads to export", "Failed to export leads"),
    };

    if leads.is_empty() {
        return HttpResponse::NotFound().json(error_body("No leads to export"));
    }

    match leads_to_csv(&leads) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"leads-export-{}.csv\"",
                    Utc::now().format("%Y-%m-%d")
                ),
            ))
            .body(body),
        Err(e) => {
            log::error!("Failed to render CSV export: {:?}", e);
            HttpResponse::InternalServerError().json(error_body("Failed to export leads"))
        }
    }
}
