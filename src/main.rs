use std::{net::TcpListener, sync::Arc};

use actix_web::web;
use env_logger::Env;
use finder::{
    configuration::get_configuration,
    services::{DroidLauncher, JobOrchestrator, LeadPipeline, WebsiteProber},
    startup::{build_lead_store, run},
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let store = build_lead_store(&configuration).await;
    let prober =
        WebsiteProber::new(&configuration.prober).expect("Failed to build HTTP client.");
    let pipeline = LeadPipeline::new(
        Arc::new(DroidLauncher::new(configuration.scraper.clone())),
        prober,
        configuration.scraper.timings.clone(),
    );
    let orchestrator = JobOrchestrator::new(Arc::new(pipeline), store.clone());

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    log::info!("Listening on {}", listener.local_addr()?);

    run(listener, orchestrator, web::Data::from(store))?.await
}
