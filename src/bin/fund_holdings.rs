// src/bin/fund_holdings.rs
use anyhow::Result;
use dotenv::dotenv;
use log::{info, warn};

use holdings_report::config::{AppConfig, Classifications};
use holdings_report::services::funds::FundHoldingsNormalizer;
use holdings_report::services::report::save_fund_holdings;
use holdings_report::services::yahoo::YahooClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    let classifications = Classifications::load(&config.classifications_path)?;

    // FUND_TICKERS wins over the configured index-fund set
    let funds = config
        .fund_tickers
        .clone()
        .unwrap_or_else(|| classifications.index_funds.clone());
    if funds.is_empty() {
        warn!("No fund tickers configured, the output will only have a header");
    }
    info!("Fetching top holdings for {:?}", funds);

    let yahoo = YahooClient::connect(&config.yahoo_base_url, classifications.statement_labels.clone()).await?;
    let rows = FundHoldingsNormalizer::new(&yahoo).normalize(&funds).await;

    save_fund_holdings(&config.fund_report_path, &rows)?;
    info!("{} holdings rows across {} funds", rows.len(), funds.len());
    Ok(())
}
