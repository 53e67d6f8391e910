// src/services/portfolio.rs
use log::{info, warn};

use crate::config::Classifications;
use crate::models::EnrichedHolding;

pub const INDEX_SECTOR: &str = "Index";

/// Final portfolio table, one row per input ticker in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub rows: Vec<EnrichedHolding>,
    /// Sum of every defined market value.
    pub total_market_value: f64,
}

/// Derives market value and portfolio weight, then overlays the static tables.
pub struct PortfolioAggregator<'a> {
    classifications: &'a Classifications,
}

impl<'a> PortfolioAggregator<'a> {
    pub fn new(classifications: &'a Classifications) -> Self {
        PortfolioAggregator { classifications }
    }

    pub fn aggregate(&self, mut rows: Vec<EnrichedHolding>) -> ReportTable {
        for row in rows.iter_mut() {
            row.market_value = row.price.map(|price| price * row.share_count);
        }

        let total_market_value: f64 = rows.iter().filter_map(|r| r.market_value).sum();
        let priced = rows.iter().filter(|r| r.market_value.is_some()).count();
        if priced < rows.len() {
            warn!(
                "{} of {} holdings have no price and are left out of the portfolio weights",
                rows.len() - priced,
                rows.len()
            );
        }

        for row in rows.iter_mut() {
            row.percentage_of_portfolio = match row.market_value {
                Some(value) if total_market_value > 0.0 => Some(value / total_market_value),
                _ => None,
            };
            self.overlay(row);
        }

        info!("Total portfolio market value: {:.2}", total_market_value);
        ReportTable { rows, total_market_value }
    }

    fn overlay(&self, row: &mut EnrichedHolding) {
        let tables = self.classifications;
        row.growth_class = tables.growth_class(&row.ticker).map(str::to_string);
        row.asset_type = tables.asset_type(&row.ticker).map(str::to_string);
        let (pe_low, pe_high) = tables.pe_band(&row.ticker);
        row.pe_low = pe_low;
        row.pe_high = pe_high;
        if tables.is_index_fund(&row.ticker) {
            row.sector = Some(INDEX_SECTOR.to_string());
        }
    }
}
