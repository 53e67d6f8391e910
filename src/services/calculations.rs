// src/services/calculations.rs
use log::{debug, warn};
use std::fmt;

use crate::config::StatementLabels;
use crate::models::{FinancialStatement, FinancialTimeSeries};

use super::provider::MarketDataProvider;

/// Number of periods between the newest value and the CAGR base value.
pub const CAGR_YEARS: usize = 3;

/// Why a growth rate could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CagrUnavailable {
    MissingStatement,
    MissingLineItem,
    InsufficientHistory(usize),
    NonPositiveBase(f64),
    NegativeLatest(f64),
    Provider(String),
}

impl fmt::Display for CagrUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CagrUnavailable::MissingStatement => write!(f, "statement not available"),
            CagrUnavailable::MissingLineItem => write!(f, "no known label for the line item"),
            CagrUnavailable::InsufficientHistory(n) => {
                write!(f, "only {} periods with values, need {}", n, CAGR_YEARS + 1)
            }
            CagrUnavailable::NonPositiveBase(v) => write!(f, "base period value {} is not positive", v),
            CagrUnavailable::NegativeLatest(v) => write!(f, "latest value {} is negative", v),
            CagrUnavailable::Provider(msg) => write!(f, "provider error: {}", msg),
        }
    }
}

impl std::error::Error for CagrUnavailable {}

pub type CagrResult = Result<f64, CagrUnavailable>;

/// `(end / start)^(1/years) - 1`. Callers guarantee a positive start value.
pub fn calculate_cagr(start_value: f64, end_value: f64, years: f64) -> f64 {
    (end_value / start_value).powf(1.0 / years) - 1.0
}

/// Three-period CAGR over a line-item series.
///
/// Values are sorted newest first after dropping gaps; the base is the value
/// three periods back from the newest, which must be strictly positive.
pub fn cagr_3y(series: &FinancialTimeSeries) -> CagrResult {
    let values = series.newest_first();
    if values.len() < CAGR_YEARS + 1 {
        return Err(CagrUnavailable::InsufficientHistory(values.len()));
    }

    let newest = values[0].1;
    let base = values[CAGR_YEARS].1;
    if base <= 0.0 {
        return Err(CagrUnavailable::NonPositiveBase(base));
    }
    // A negative ratio has no real fractional root
    if newest < 0.0 {
        return Err(CagrUnavailable::NegativeLatest(newest));
    }

    Ok(calculate_cagr(base, newest, CAGR_YEARS as f64))
}

/// Locates and derives the series the growth rates are computed from.
pub struct GrowthRateCalculator<'a> {
    labels: &'a StatementLabels,
}

impl<'a> GrowthRateCalculator<'a> {
    pub fn new(labels: &'a StatementLabels) -> Self {
        GrowthRateCalculator { labels }
    }

    pub fn eps_series(&self, statement: &FinancialStatement) -> Option<FinancialTimeSeries> {
        statement.find(&self.labels.diluted_eps).cloned()
    }

    /// Free cash flow: operating cash flow plus capital expenditure, which the
    /// provider already reports as a negative amount.
    pub fn fcf_series(&self, statement: &FinancialStatement) -> Option<FinancialTimeSeries> {
        let ocf = statement.find(&self.labels.operating_cash_flow)?;
        let capex = statement.find(&self.labels.capital_expenditure)?;
        Some(ocf.add_aligned(capex))
    }

    pub fn eps_cagr(&self, statement: Option<&FinancialStatement>) -> CagrResult {
        let statement = statement.filter(|s| !s.is_empty()).ok_or(CagrUnavailable::MissingStatement)?;
        let series = self.eps_series(statement).ok_or(CagrUnavailable::MissingLineItem)?;
        cagr_3y(&series)
    }

    pub fn fcf_cagr(&self, statement: Option<&FinancialStatement>) -> CagrResult {
        let statement = statement.filter(|s| !s.is_empty()).ok_or(CagrUnavailable::MissingStatement)?;
        let series = self.fcf_series(statement).ok_or(CagrUnavailable::MissingLineItem)?;
        cagr_3y(&series)
    }

    /// EPS growth straight from the provider. Never fails: every problem becomes `None`.
    pub async fn eps_cagr_3y(&self, provider: &dyn MarketDataProvider, ticker: &str) -> Option<f64> {
        let result = match provider.income_statement(ticker).await {
            Ok(statement) => self.eps_cagr(statement.as_ref()),
            Err(e) => Err(CagrUnavailable::Provider(e.to_string())),
        };
        settle(ticker, "EPS", result)
    }

    /// FCF growth straight from the provider. Never fails: every problem becomes `None`.
    pub async fn fcf_cagr_3y(&self, provider: &dyn MarketDataProvider, ticker: &str) -> Option<f64> {
        let result = match provider.cash_flow(ticker).await {
            Ok(statement) => self.fcf_cagr(statement.as_ref()),
            Err(e) => Err(CagrUnavailable::Provider(e.to_string())),
        };
        settle(ticker, "FCF", result)
    }
}

fn settle(ticker: &str, metric: &str, result: CagrResult) -> Option<f64> {
    match result {
        Ok(rate) if rate.is_finite() => Some(rate),
        Ok(rate) => {
            warn!("{} CAGR for {} is not finite ({}), dropping it", metric, ticker, rate);
            None
        }
        Err(CagrUnavailable::Provider(msg)) => {
            warn!("{} CAGR for {} unavailable: provider error: {}", metric, ticker, msg);
            None
        }
        Err(reason) => {
            debug!("{} CAGR for {} unavailable: {}", metric, ticker, reason);
            None
        }
    }
}
