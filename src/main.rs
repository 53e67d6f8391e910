use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{error, info};

use holdings_report::config::{AppConfig, Classifications};
use holdings_report::services::enricher::HoldingEnricher;
use holdings_report::services::holdings::load_holdings;
use holdings_report::services::portfolio::PortfolioAggregator;
use holdings_report::services::report::save_portfolio_report;
use holdings_report::services::yahoo::YahooClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Building the portfolio report...");

    let config = AppConfig::from_env()?;
    let classifications = Classifications::load(&config.classifications_path)?;

    let holdings = load_holdings(&config.holdings_path)?;
    if holdings.is_empty() {
        error!("No usable rows in {}", config.holdings_path.display());
    }

    let yahoo = YahooClient::connect(&config.yahoo_base_url, classifications.statement_labels.clone()).await?;

    let tickers: Vec<String> = holdings.iter().map(|h| h.ticker.clone()).collect();
    let enricher = HoldingEnricher::new(&yahoo, &classifications, &holdings);
    let enriched = enricher.enrich_all(&tickers, config.enrich_concurrency).await;

    let table = PortfolioAggregator::new(&classifications).aggregate(enriched);
    save_portfolio_report(&config.report_path, &table)
        .with_context(|| format!("failed to write {}", config.report_path.display()))?;

    info!("Report complete: {} holdings", table.rows.len());
    Ok(())
}
