// src/config.rs
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Runtime settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub holdings_path: PathBuf,
    pub classifications_path: PathBuf,
    pub report_path: PathBuf,
    pub fund_report_path: PathBuf,
    pub yahoo_base_url: String,
    pub enrich_concurrency: usize,
    pub fund_tickers: Option<BTreeSet<String>>,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("${} not set, defaulting to {}", key, default);
        default.to_string()
    })
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let concurrency_str = env_or("ENRICH_CONCURRENCY", "1");
        let enrich_concurrency: usize = concurrency_str
            .trim()
            .parse()
            .with_context(|| format!("ENRICH_CONCURRENCY must be a number, got {:?}", concurrency_str))?;
        if enrich_concurrency == 0 {
            warn!("ENRICH_CONCURRENCY of 0 is not usable, running sequentially");
        }

        let fund_tickers = env::var("FUND_TICKERS").ok().map(|raw| parse_ticker_list(&raw));

        Ok(AppConfig {
            holdings_path: env_or("HOLDINGS_PATH", "holdings.csv").into(),
            classifications_path: env_or("CLASSIFICATIONS_PATH", "config/classifications.json").into(),
            report_path: env_or("REPORT_PATH", "stock_fundamentals.csv").into(),
            fund_report_path: env_or("FUND_REPORT_PATH", "etf_top_holdings.csv").into(),
            yahoo_base_url: env_or("YAHOO_BASE_URL", DEFAULT_YAHOO_BASE_URL),
            enrich_concurrency: enrich_concurrency.max(1),
            fund_tickers,
        })
    }
}

/// Comma separated ticker list, trimmed and uppercased. Blank entries are ignored.
pub fn parse_ticker_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Label spellings the provider has used for the statement line items we read.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatementLabels {
    pub diluted_eps: Vec<String>,
    pub operating_cash_flow: Vec<String>,
    pub capital_expenditure: Vec<String>,
}

impl Default for StatementLabels {
    fn default() -> Self {
        StatementLabels {
            diluted_eps: vec!["Diluted EPS".to_string()],
            operating_cash_flow: vec![
                "Operating Cash Flow".to_string(),
                "Net Cash Provided by Operating Activities".to_string(),
                "Net Cash from Operating Activities".to_string(),
                "Cash Flow from Operations".to_string(),
            ],
            capital_expenditure: vec![
                "Capital Expenditures".to_string(),
                "Capital Expenditure".to_string(),
                "Purchase of PPE".to_string(),
            ],
        }
    }
}

impl StatementLabels {
    pub fn income_statement(&self) -> &[String] {
        &self.diluted_eps
    }

    /// Every cash-flow label, operating cash flow first.
    pub fn cash_flow(&self) -> Vec<String> {
        self.operating_cash_flow
            .iter()
            .chain(self.capital_expenditure.iter())
            .cloned()
            .collect()
    }
}

/// Hand-maintained lookup tables keyed by ticker.
///
/// None of the lookups fail: an unmapped ticker yields `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Classifications {
    pub expense_ratios: HashMap<String, f64>,
    pub growth_class: HashMap<String, String>,
    pub asset_type: HashMap<String, String>,
    pub pe_low: HashMap<String, f64>,
    pub pe_high: HashMap<String, f64>,
    pub index_funds: BTreeSet<String>,
    pub statement_labels: StatementLabels,
}

impl Classifications {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading classification tables from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut tables: Classifications = serde_json::from_str(text)?;
        tables.normalize_keys();
        Ok(tables)
    }

    // Tickers are compared uppercased everywhere else
    fn normalize_keys(&mut self) {
        fn upper<V>(map: &mut HashMap<String, V>) {
            let upper: HashMap<String, V> = map.drain().map(|(k, v)| (k.trim().to_uppercase(), v)).collect();
            *map = upper;
        }
        upper(&mut self.expense_ratios);
        upper(&mut self.growth_class);
        upper(&mut self.asset_type);
        upper(&mut self.pe_low);
        upper(&mut self.pe_high);
        self.index_funds = self.index_funds.iter().map(|t| t.trim().to_uppercase()).collect();
    }

    pub fn expense_ratio(&self, ticker: &str) -> Option<f64> {
        self.expense_ratios.get(ticker).copied()
    }

    pub fn growth_class(&self, ticker: &str) -> Option<&str> {
        self.growth_class.get(ticker).map(String::as_str)
    }

    pub fn asset_type(&self, ticker: &str) -> Option<&str> {
        self.asset_type.get(ticker).map(String::as_str)
    }

    pub fn pe_band(&self, ticker: &str) -> (Option<f64>, Option<f64>) {
        (self.pe_low.get(ticker).copied(), self.pe_high.get(ticker).copied())
    }

    pub fn is_index_fund(&self, ticker: &str) -> bool {
        self.index_funds.contains(ticker)
    }
}
