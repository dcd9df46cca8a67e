use std::{
    net::TcpListener,
    sync::Arc,
    time::{Duration, Instant},
};

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use crate::{
    configuration::Settings,
    dal::{LeadStore, MemoryLeadStore, PgLeadStore},
    routes::{api_routes, health_route::ServerStarted},
    services::JobOrchestrator,
};

/// Postgres when a database is configured, otherwise a process-local store.
pub async fn build_lead_store(configuration: &Settings) -> Arc<dyn LeadStore> {
    let Some(database) = &configuration.database else {
        log::info!("No database configured, leads are kept in memory");
        return Arc::new(MemoryLeadStore::new());
    };

    let pool_options = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)) // 15 minutes
        .max_lifetime(None);

    let connection_pool = pool_options.connect_lazy_with(database.with_db());
    if let Err(e) = sqlx::migrate!("./migrations").run(&connection_pool).await {
        log::error!("Error running migrations: {:?}", e);
    }

    Arc::new(PgLeadStore::new(connection_pool))
}

pub fn run(
    listener: TcpListener,
    orchestrator: JobOrchestrator,
    store: web::Data<dyn LeadStore>,
) -> Result<Server, std::io::Error> {
    let orchestrator = web::Data::new(orchestrator);
    let started = web::Data::new(ServerStarted(Instant::now()));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(api_routes)
            .app_data(orchestrator.clone())
            .app_data(store.clone())
            .app_data(started.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
