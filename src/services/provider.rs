// src/services/provider.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::FinancialStatement;

/// One daily bar from the price history.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// General quote information. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerInfo {
    pub sector: Option<String>,
    pub trailing_pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
}

/// A row of a fund's top-holdings table, keyed by company name.
#[derive(Debug, Clone, PartialEq)]
pub struct TopHolding {
    pub company_name: String,
    pub holding_percent: f64,
}

/// A row of a fund's equity-holdings table: company name -> ticker symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityHolding {
    pub company_name: String,
    pub symbol: Option<String>,
}

/// Everything the pipelines need from a market-data source, queried per ticker.
///
/// `Ok(None)` means the provider answered but had nothing for the ticker;
/// `Err` means the call itself failed.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn last_price(&self, ticker: &str) -> Result<Option<f64>>;

    async fn daily_history(&self, ticker: &str) -> Result<Vec<PriceBar>>;

    async fn info(&self, ticker: &str) -> Result<TickerInfo>;

    async fn income_statement(&self, ticker: &str) -> Result<Option<FinancialStatement>>;

    async fn cash_flow(&self, ticker: &str) -> Result<Option<FinancialStatement>>;

    async fn top_holdings(&self, fund: &str) -> Result<Option<Vec<TopHolding>>>;

    async fn equity_holdings(&self, fund: &str) -> Result<Option<Vec<EquityHolding>>>;
}
