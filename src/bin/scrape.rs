use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use finder::{
    configuration::get_configuration,
    domain::{
        job::ScrapeQuery,
        lead::{Lead, WebsiteStatus},
    },
    services::{DroidLauncher, LeadPipeline, WebsiteProber},
    startup::build_lead_store,
};

/// Scrape one Google Maps search into leads and store them.
#[derive(Debug, Parser)]
#[command(name = "finder-scrape", version)]
struct Cli {
    /// Business category to search for, e.g. "Bengkel Las"
    #[arg(long)]
    keyword: String,

    /// City or area appended to the search
    #[arg(long)]
    location: String,

    /// Upper bound on listings visited
    #[arg(long = "max", default_value_t = 40)]
    max_results: u32,
}

fn count(leads: &[Lead], status: WebsiteStatus) -> usize {
    leads.iter().filter(|l| l.website_status == status).count()
}

async fn scrape(cli: Cli) -> anyhow::Result<ExitCode> {
    let configuration = get_configuration().context("Failed to read configuration")?;

    let prober = WebsiteProber::new(&configuration.prober)?;
    let pipeline = LeadPipeline::new(
        Arc::new(DroidLauncher::new(configuration.scraper.clone())),
        prober,
        configuration.scraper.timings.clone(),
    );
    let query = ScrapeQuery::new(cli.keyword, cli.location, cli.max_results);

    log::info!("Scraping \"{}\"", query.search_query());
    let leads = pipeline.run(&query).await?;

    println!("Scraped {} leads for \"{}\"", leads.len(), query.search_query());
    println!("  no website:     {}", count(&leads, WebsiteStatus::None));
    println!("  active website: {}", count(&leads, WebsiteStatus::Active));
    println!("  dead website:   {}", count(&leads, WebsiteStatus::Dead));

    if leads.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let store = build_lead_store(&configuration).await;
    match store.insert_many(&leads).await {
        Ok(saved) => {
            println!("Saved {} leads", saved.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            log::error!("Error saving leads: {:?}", e);
            println!("{}", serde_json::to_string_pretty(&leads)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    scrape(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn max_defaults_to_forty() {
        let cli = Cli::parse_from(["finder-scrape", "--keyword", "Cafe", "--location", "Bandung"]);
        assert_eq!(cli.max_results, 40);

        let cli = Cli::try_parse_from([
            "finder-scrape",
            "--keyword",
            "Cafe",
            "--location",
            "Bandung",
            "--max",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.max_results, 7);
    }
}
