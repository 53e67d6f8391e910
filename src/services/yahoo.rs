// src/services/yahoo.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::{debug, error, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::StatementLabels;
use crate::models::{FinancialStatement, FinancialTimeSeries};

use super::provider::{EquityHolding, MarketDataProvider, PriceBar, TickerInfo, TopHolding};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
// Hands out the session cookie the crumb endpoint expects
const CONSENT_URL: &str = "https://fc.yahoo.com";
const INFO_MODULES: &str = "assetProfile,summaryDetail,defaultKeyStatistics,price";
const STATEMENT_YEARS: i32 = 10;

/// Yahoo Finance backed `MarketDataProvider`.
pub struct YahooClient {
    client: Client,
    base_url: String,
    crumb: Option<String>,
    labels: StatementLabels,
    // topHoldings responses per fund, shared by top_holdings and equity_holdings
    holdings_cache: Mutex<HashMap<String, Option<Vec<Value>>>>,
}

impl YahooClient {
    /// Client without a crumb. Enough for the chart and timeseries endpoints.
    pub fn new(base_url: &str, labels: StatementLabels) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(YahooClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            crumb: None,
            labels,
            holdings_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Client with a session crumb, which quoteSummary requires. A missing crumb
    /// is logged and the client carries on without one.
    pub async fn connect(base_url: &str, labels: StatementLabels) -> Result<Self> {
        let mut yahoo = Self::new(base_url, labels)?;
        match yahoo.fetch_crumb().await {
            Ok(crumb) => {
                info!("Obtained Yahoo crumb");
                yahoo.crumb = Some(crumb);
            }
            Err(e) => warn!("Could not obtain Yahoo crumb, continuing without: {}", e),
        }
        Ok(yahoo)
    }

    async fn fetch_crumb(&self) -> Result<String> {
        if let Err(e) = self.client.get(CONSENT_URL).send().await {
            debug!("Consent cookie request failed: {}", e);
        }
        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let crumb = self.client.get(&url).send().await?.error_for_status()?.text().await?;
        let crumb = crumb.trim();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
            return Err(anyhow!("unexpected crumb response {:?}", crumb));
        }
        Ok(crumb.to_string())
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!("Fetching {} {:?}", url, query);
        let mut request = self.client.get(url).query(query);
        if let Some(crumb) = &self.crumb {
            request = request.query(&[("crumb", crumb)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Request failed for {}: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Yahoo API error for {}: {} - {}", url, status, body);
            return Err(anyhow!("HTTP error for {}: {}", url, status));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse JSON from {}: {}", url, e))
    }

    async fn chart(&self, ticker: &str) -> Result<Value> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let data = self
            .get_json(&url, &[("interval", "1d".to_string()), ("range", "1d".to_string())])
            .await?;
        check_api_error(&data, "chart", ticker)?;
        first_result(&data, "chart", ticker)
    }

    async fn quote_summary(&self, ticker: &str, modules: &str) -> Result<Value> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        let data = self.get_json(&url, &[("modules", modules.to_string())]).await?;
        check_api_error(&data, "quoteSummary", ticker)?;
        first_result(&data, "quoteSummary", ticker)
    }

    async fn statement(&self, ticker: &str, labels: &[String]) -> Result<Option<FinancialStatement>> {
        let by_type: HashMap<String, String> = labels
            .iter()
            .map(|label| (timeseries_type(label), label.clone()))
            .collect();
        let mut types: Vec<&str> = by_type.keys().map(String::as_str).collect();
        types.sort_unstable();

        let now = Utc::now();
        let start = NaiveDate::from_ymd_opt(now.year() - STATEMENT_YEARS, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.base_url, ticker
        );
        let data = self
            .get_json(
                &url,
                &[
                    ("symbol", ticker.to_string()),
                    ("type", types.join(",")),
                    ("period1", start.to_string()),
                    ("period2", now.timestamp().to_string()),
                ],
            )
            .await?;

        Ok(parse_timeseries(&data, &by_type))
    }

    /// One topHoldings request per fund. Failures are not cached.
    async fn holdings_table(&self, fund: &str) -> Result<Option<Vec<Value>>> {
        let cached = self.holdings_cache.lock().ok().and_then(|c| c.get(fund).cloned());
        if let Some(table) = cached {
            debug!("Using cached topHoldings for {}", fund);
            return Ok(table);
        }

        let result = self.quote_summary(fund, "topHoldings").await?;
        let table = result
            .pointer("/topHoldings/holdings")
            .and_then(Value::as_array)
            .cloned();
        if let Ok(mut cache) = self.holdings_cache.lock() {
            cache.insert(fund.to_string(), table.clone());
        }
        Ok(table)
    }
}

/// `"Diluted EPS"` -> `"annualDilutedEPS"`, the key the timeseries endpoint uses.
pub fn timeseries_type(label: &str) -> String {
    let mut key = String::from("annual");
    for word in label.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            key.push(first.to_ascii_uppercase());
            key.extend(chars);
        }
    }
    key
}

fn check_api_error(data: &Value, root: &str, ticker: &str) -> Result<()> {
    if let Some(error) = data.get(root).and_then(|c| c.get("error")).and_then(Value::as_object) {
        let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
        let desc = error.get("description").and_then(Value::as_str).unwrap_or("No description");
        error!("Yahoo API returned error for {}: {} - {}", ticker, code, desc);
        return Err(anyhow!("Yahoo API error for {}: {} - {}", ticker, code, desc));
    }
    Ok(())
}

fn first_result(data: &Value, root: &str, ticker: &str) -> Result<Value> {
    data.get(root)
        .and_then(|c| c.get("result"))
        .and_then(|r| r.get(0))
        .cloned()
        .ok_or_else(|| anyhow!("No {} result for {}", root, ticker))
}

fn raw_f64(module: &Value, field: &str) -> Option<f64> {
    module
        .get(field)
        .and_then(|v| v.get("raw").or(Some(v)))
        .and_then(Value::as_f64)
}

pub fn parse_last_price(chart: &Value) -> Option<f64> {
    chart.pointer("/meta/regularMarketPrice").and_then(Value::as_f64)
}

pub fn parse_daily_bars(chart: &Value) -> Vec<PriceBar> {
    let timestamps = match chart.get("timestamp").and_then(Value::as_array) {
        Some(ts) => ts,
        None => return Vec::new(),
    };
    let closes = chart
        .pointer("/indicators/quote/0/close")
        .and_then(Value::as_array);

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = DateTime::from_timestamp(ts.as_i64()?, 0)?.date_naive();
            let close = closes.and_then(|c| c.get(i)).and_then(Value::as_f64);
            Some(PriceBar { date, close })
        })
        .collect()
}

pub fn parse_info(summary: &Value) -> TickerInfo {
    let null = Value::Null;
    let profile = summary.get("assetProfile").unwrap_or(&null);
    let detail = summary.get("summaryDetail").unwrap_or(&null);
    let stats = summary.get("defaultKeyStatistics").unwrap_or(&null);
    let price = summary.get("price").unwrap_or(&null);

    TickerInfo {
        sector: profile
            .get("sector")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        trailing_pe: raw_f64(detail, "trailingPE"),
        market_cap: raw_f64(detail, "marketCap").or_else(|| raw_f64(price, "marketCap")),
        beta: raw_f64(detail, "beta").or_else(|| raw_f64(stats, "beta")),
    }
}

/// Builds a statement from a timeseries response. `by_type` maps each
/// requested type key back to the label it was derived from.
pub fn parse_timeseries(data: &Value, by_type: &HashMap<String, String>) -> Option<FinancialStatement> {
    let results = data.pointer("/timeseries/result").and_then(Value::as_array)?;
    let mut statement = FinancialStatement::default();

    for result in results {
        let kind = match result.pointer("/meta/type/0").and_then(Value::as_str) {
            Some(kind) => kind,
            None => continue,
        };
        let label = match by_type.get(kind) {
            Some(label) => label,
            None => continue,
        };
        let entries = match result.get(kind).and_then(Value::as_array) {
            Some(entries) => entries,
            None => continue,
        };

        let points: Vec<(NaiveDate, Option<f64>)> = entries
            .iter()
            .filter_map(|entry| {
                let as_of = entry.get("asOfDate")?.as_str()?;
                let period = NaiveDate::parse_from_str(as_of, "%Y-%m-%d").ok()?;
                let value = entry.pointer("/reportedValue/raw").and_then(Value::as_f64);
                Some((period, value))
            })
            .collect();

        if !points.is_empty() {
            statement.line_items.insert(label.clone(), FinancialTimeSeries::new(points));
        }
    }

    if statement.is_empty() {
        None
    } else {
        Some(statement)
    }
}

pub fn parse_top_holdings(holdings: &[Value]) -> Vec<TopHolding> {
    holdings
        .iter()
        .filter_map(|h| {
            let company_name = h.get("holdingName").and_then(Value::as_str)?.trim().to_string();
            let holding_percent = raw_f64(h, "holdingPercent")?;
            Some(TopHolding { company_name, holding_percent })
        })
        .collect()
}

pub fn parse_equity_holdings(holdings: &[Value]) -> Vec<EquityHolding> {
    holdings
        .iter()
        .filter_map(|h| {
            let company_name = h.get("holdingName").and_then(Value::as_str)?.trim().to_string();
            let symbol = h
                .get("symbol")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            Some(EquityHolding { company_name, symbol })
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn last_price(&self, ticker: &str) -> Result<Option<f64>> {
        let chart = self.chart(ticker).await?;
        Ok(parse_last_price(&chart))
    }

    async fn daily_history(&self, ticker: &str) -> Result<Vec<PriceBar>> {
        let chart = self.chart(ticker).await?;
        Ok(parse_daily_bars(&chart))
    }

    async fn info(&self, ticker: &str) -> Result<TickerInfo> {
        let summary = self.quote_summary(ticker, INFO_MODULES).await?;
        Ok(parse_info(&summary))
    }

    async fn income_statement(&self, ticker: &str) -> Result<Option<FinancialStatement>> {
        let labels = self.labels.income_statement().to_vec();
        self.statement(ticker, &labels).await
    }

    async fn cash_flow(&self, ticker: &str) -> Result<Option<FinancialStatement>> {
        let labels = self.labels.cash_flow();
        self.statement(ticker, &labels).await
    }

    async fn top_holdings(&self, fund: &str) -> Result<Option<Vec<TopHolding>>> {
        Ok(self.holdings_table(fund).await?.map(|h| parse_top_holdings(&h)))
    }

    async fn equity_holdings(&self, fund: &str) -> Result<Option<Vec<EquityHolding>>> {
        Ok(self.holdings_table(fund).await?.map(|h| parse_equity_holdings(&h)))
    }
}
