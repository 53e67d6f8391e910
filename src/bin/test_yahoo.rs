use holdings_report::config::{StatementLabels, DEFAULT_YAHOO_BASE_URL};
use holdings_report::services::calculations::GrowthRateCalculator;
use holdings_report::services::price::PriceResolver;
use holdings_report::services::yahoo::YahooClient;
use log::{error, info};
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let ticker = std::env::args().nth(1).unwrap_or_else(|| "VOO".to_string()).to_uppercase();
    info!("Testing Yahoo Finance lookups for {}...", ticker);

    let labels = StatementLabels::default();
    let yahoo = YahooClient::connect(DEFAULT_YAHOO_BASE_URL, labels.clone()).await?;

    match PriceResolver::new(&yahoo).resolve(&ticker).await {
        Some(price) => info!("SUCCESS: {} price: {}", ticker, price),
        None => error!("ERROR: no price for {}", ticker),
    }

    let growth = GrowthRateCalculator::new(&labels);
    println!("EPS CAGR 3y: {:?}", growth.eps_cagr_3y(&yahoo, &ticker).await);
    println!("FCF CAGR 3y: {:?}", growth.fcf_cagr_3y(&yahoo, &ticker).await);

    Ok(())
}
