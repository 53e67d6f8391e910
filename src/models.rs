// src/models.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One validated row of the holdings list.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingInput {
    pub ticker: String,
    pub share_count: f64,
}

/// Per-ticker record built by the enricher and completed by the aggregator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedHolding {
    pub ticker: String,
    pub price: Option<f64>,
    pub sector: Option<String>,
    pub pe_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub expense_ratio: Option<f64>,
    pub share_count: f64,
    pub eps_cagr_3y: Option<f64>,
    pub fcf_cagr_3y: Option<f64>,
    // Filled in by PortfolioAggregator once every ticker is enriched
    pub market_value: Option<f64>,
    pub growth_class: Option<String>,
    pub asset_type: Option<String>,
    pub pe_low: Option<f64>,
    pub pe_high: Option<f64>,
    pub percentage_of_portfolio: Option<f64>,
}

/// Values of a single statement line item, one per reporting period.
///
/// Periods may arrive unordered and carry gaps as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialTimeSeries {
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl FinancialTimeSeries {
    pub fn new(points: Vec<(NaiveDate, Option<f64>)>) -> Self {
        FinancialTimeSeries { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Defined values sorted newest period first.
    pub fn newest_first(&self) -> Vec<(NaiveDate, f64)> {
        let mut values: Vec<(NaiveDate, f64)> = self
            .points
            .iter()
            .filter_map(|(period, value)| value.filter(|v| v.is_finite()).map(|v| (*period, v)))
            .collect();
        values.sort_by(|a, b| b.0.cmp(&a.0));
        values
    }

    /// Period-aligned addition. A period is kept only when both sides carry a value for it.
    pub fn add_aligned(&self, other: &FinancialTimeSeries) -> FinancialTimeSeries {
        let rhs: HashMap<NaiveDate, f64> = other
            .points
            .iter()
            .filter_map(|(period, value)| value.map(|v| (*period, v)))
            .collect();

        let points = self
            .points
            .iter()
            .filter_map(|(period, value)| {
                let lhs = (*value)?;
                let rhs = rhs.get(period)?;
                Some((*period, Some(lhs + rhs)))
            })
            .collect();

        FinancialTimeSeries { points }
    }
}

/// A statement as returned by the provider: line-item label -> time series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialStatement {
    pub line_items: BTreeMap<String, FinancialTimeSeries>,
}

impl FinancialStatement {
    pub fn is_empty(&self) -> bool {
        self.line_items.values().all(FinancialTimeSeries::is_empty)
    }

    /// First line item whose label matches one of `labels`, in list order.
    /// An exact label wins; otherwise matching ignores case and surrounding
    /// whitespace, taking the first such label in sorted order.
    pub fn find(&self, labels: &[String]) -> Option<&FinancialTimeSeries> {
        labels.iter().find_map(|wanted| {
            let wanted = wanted.trim();
            self.line_items.get(wanted).or_else(|| {
                self.line_items
                    .iter()
                    .find(|(label, _)| label.trim().eq_ignore_ascii_case(wanted))
                    .map(|(_, series)| series)
            })
        })
    }
}

/// One constituent row of the cross-fund holdings table.
#[derive(Debug, Clone, PartialEq)]
pub struct FundHoldingRow {
    pub fund_ticker: String,
    pub constituent_ticker: Option<String>,
    pub company_name: String,
    pub holding_percent: f64,
}

/// Row layout of the portfolio report sink.
#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    #[serde(rename = "Ticker")]
    pub ticker: &'a str,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Sector")]
    pub sector: Option<&'a str>,
    #[serde(rename = "PE Ratio")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "Market Cap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "Beta")]
    pub beta: Option<f64>,
    #[serde(rename = "Expense Ratio")]
    pub expense_ratio: Option<f64>,
    #[serde(rename = "Number of Stocks")]
    pub share_count: f64,
    #[serde(rename = "Market value")]
    pub market_value: Option<f64>,
    #[serde(rename = "Growth Class")]
    pub growth_class: Option<&'a str>,
    #[serde(rename = "Type")]
    pub asset_type: Option<&'a str>,
    #[serde(rename = "PE low")]
    pub pe_low: Option<f64>,
    #[serde(rename = "PE high")]
    pub pe_high: Option<f64>,
    #[serde(rename = "Percentage")]
    pub percentage: Option<f64>,
    #[serde(rename = "eps_CAGR_3y")]
    pub eps_cagr_3y: Option<f64>,
    #[serde(rename = "fcf_CAGR_3y")]
    pub fcf_cagr_3y: Option<f64>,
}

impl<'a> From<&'a EnrichedHolding> for ReportRow<'a> {
    fn from(h: &'a EnrichedHolding) -> Self {
        ReportRow {
            ticker: &h.ticker,
            price: h.price,
            sector: h.sector.as_deref(),
            pe_ratio: h.pe_ratio,
            market_cap: h.market_cap,
            beta: h.beta,
            expense_ratio: h.expense_ratio,
            share_count: h.share_count,
            market_value: h.market_value,
            growth_class: h.growth_class.as_deref(),
            asset_type: h.asset_type.as_deref(),
            pe_low: h.pe_low,
            pe_high: h.pe_high,
            percentage: h.percentage_of_portfolio,
            eps_cagr_3y: h.eps_cagr_3y,
            fcf_cagr_3y: h.fcf_cagr_3y,
        }
    }
}

/// Row layout of the fund holdings sink.
#[derive(Debug, Serialize)]
pub struct FundReportRow<'a> {
    #[serde(rename = "ETF")]
    pub fund_ticker: &'a str,
    #[serde(rename = "Symbol")]
    pub symbol: Option<&'a str>,
    #[serde(rename = "Company Name")]
    pub company_name: &'a str,
    #[serde(rename = "Holding Percent")]
    pub holding_percent: f64,
}

impl<'a> From<&'a FundHoldingRow> for FundReportRow<'a> {
    fn from(row: &'a FundHoldingRow) -> Self {
        FundReportRow {
            fund_ticker: &row.fund_ticker,
            symbol: row.constituent_ticker.as_deref(),
            company_name: &row.company_name,
            holding_percent: row.holding_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, 12, 31).unwrap()
    }

    #[test]
    fn newest_first_drops_gaps_and_sorts() {
        let series = FinancialTimeSeries::new(vec![
            (date(2021), Some(1.0)),
            (date(2023), Some(3.0)),
            (date(2022), None),
            (date(2020), Some(f64::NAN)),
        ]);
        let values = series.newest_first();
        assert_eq!(values, vec![(date(2023), 3.0), (date(2021), 1.0)]);
    }

    #[test]
    fn add_aligned_keeps_only_shared_periods() {
        let ocf = FinancialTimeSeries::new(vec![
            (date(2023), Some(100.0)),
            (date(2022), Some(90.0)),
            (date(2021), Some(80.0)),
        ]);
        let capex = FinancialTimeSeries::new(vec![
            (date(2023), Some(-20.0)),
            (date(2022), None),
            (date(2020), Some(-5.0)),
        ]);
        let fcf = ocf.add_aligned(&capex);
        assert_eq!(fcf.points, vec![(date(2023), Some(80.0))]);
    }

    #[test]
    fn find_follows_label_priority_and_ignores_case() {
        let mut statement = FinancialStatement::default();
        statement.line_items.insert(
            "capital expenditure".to_string(),
            FinancialTimeSeries::new(vec![(date(2023), Some(-1.0))]),
        );
        statement.line_items.insert(
            "Purchase of PPE".to_string(),
            FinancialTimeSeries::new(vec![(date(2023), Some(-2.0))]),
        );
        let labels = vec!["Capital Expenditures".to_string(), "Capital Expenditure".to_string(), "Purchase of PPE".to_string()];
        let found = statement.find(&labels).unwrap();
        assert_eq!(found.points[0].1, Some(-1.0));
        assert!(statement.find(&["Diluted EPS".to_string()]).is_none());
    }

    #[test]
    fn find_prefers_exact_label_over_case_variant() {
        let mut statement = FinancialStatement::default();
        for (label, eps) in [("diluted eps", 1.0), ("Diluted EPS", 2.0), ("DILUTED EPS", 3.0)] {
            statement
                .line_items
                .insert(label.to_string(), FinancialTimeSeries::new(vec![(date(2023), Some(eps))]));
        }
        let found = statement.find(&["Diluted EPS".to_string()]).unwrap();
        assert_eq!(found.points[0].1, Some(2.0));

        // No exact match: the first case-insensitive label in sorted order
        let found = statement.find(&["diluted EPS".to_string()]).unwrap();
        assert_eq!(found.points[0].1, Some(3.0));
    }
}
