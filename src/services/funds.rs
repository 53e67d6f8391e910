// src/services/funds.rs
use anyhow::Result;
use log::{error, info, warn};
use std::collections::{BTreeSet, HashMap};

use crate::models::FundHoldingRow;

use super::provider::MarketDataProvider;

/// Collects each fund's top holdings into one table sorted by fund ticker
/// ascending, then holding percent descending.
pub struct FundHoldingsNormalizer<'a> {
    provider: &'a dyn MarketDataProvider,
}

impl<'a> FundHoldingsNormalizer<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider) -> Self {
        FundHoldingsNormalizer { provider }
    }

    pub async fn normalize(&self, fund_tickers: &BTreeSet<String>) -> Vec<FundHoldingRow> {
        let mut all_rows = Vec::new();

        for fund in fund_tickers {
            match self.fund_rows(fund).await {
                Ok(Some(rows)) => {
                    info!("Collected {} holdings for {}", rows.len(), fund);
                    all_rows.extend(rows);
                }
                Ok(None) => warn!("No holdings data found for {}", fund),
                Err(e) => error!("Could not retrieve data for {}: {}", fund, e),
            }
        }

        all_rows.sort_by(|a, b| {
            a.fund_ticker
                .cmp(&b.fund_ticker)
                .then_with(|| b.holding_percent.total_cmp(&a.holding_percent))
        });
        all_rows
    }

    async fn fund_rows(&self, fund: &str) -> Result<Option<Vec<FundHoldingRow>>> {
        let top = match self.provider.top_holdings(fund).await? {
            Some(top) if !top.is_empty() => top,
            _ => return Ok(None),
        };

        let symbols: HashMap<String, String> = self
            .provider
            .equity_holdings(fund)
            .await?
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| e.symbol.map(|symbol| (e.company_name, symbol)))
            .collect();

        let rows = top
            .into_iter()
            .map(|holding| FundHoldingRow {
                fund_ticker: fund.to_string(),
                constituent_ticker: symbols.get(&holding.company_name).cloned(),
                company_name: holding.company_name,
                holding_percent: holding.holding_percent,
            })
            .collect();

        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::testing::StubProvider;
    use crate::services::provider::{EquityHolding, TopHolding};

    fn top(rows: &[(&str, f64)]) -> Vec<TopHolding> {
        rows.iter()
            .map(|(name, pct)| TopHolding { company_name: name.to_string(), holding_percent: *pct })
            .collect()
    }

    fn equity(rows: &[(&str, &str)]) -> Vec<EquityHolding> {
        rows.iter()
            .map(|(name, symbol)| EquityHolding { company_name: name.to_string(), symbol: Some(symbol.to_string()) })
            .collect()
    }

    fn funds(tickers: &[&str]) -> BTreeSet<String> {
        tickers.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn failing_fund_is_skipped_and_rest_sorted() {
        let mut stub = StubProvider::default();
        stub.top.insert("VOO".into(), top(&[("Apple Inc", 0.07), ("Microsoft Corp", 0.065), ("NVIDIA Corp", 0.071)]));
        stub.equity.insert("VOO".into(), equity(&[("Apple Inc", "AAPL"), ("NVIDIA Corp", "NVDA")]));
        stub.top.insert("SCHD".into(), top(&[("Coca-Cola Co", 0.04), ("AbbVie Inc", 0.045)]));
        stub.failing.insert("QQQM".into());

        let rows = FundHoldingsNormalizer::new(&stub).normalize(&funds(&["VOO", "QQQM", "SCHD"])).await;

        let summary: Vec<(&str, &str, f64)> = rows
            .iter()
            .map(|r| (r.fund_ticker.as_str(), r.company_name.as_str(), r.holding_percent))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("SCHD", "AbbVie Inc", 0.045),
                ("SCHD", "Coca-Cola Co", 0.04),
                ("VOO", "NVIDIA Corp", 0.071),
                ("VOO", "Apple Inc", 0.07),
                ("VOO", "Microsoft Corp", 0.065),
            ]
        );
        assert_eq!(rows[2].constituent_ticker.as_deref(), Some("NVDA"));
        // Not in the equity table
        assert_eq!(rows[4].constituent_ticker, None);
        // No equity table at all
        assert!(rows[..2].iter().all(|r| r.constituent_ticker.is_none()));
    }

    #[tokio::test]
    async fn empty_or_missing_holdings_skip_the_fund() {
        let mut stub = StubProvider::default();
        stub.top.insert("VGT".into(), Vec::new());
        stub.top.insert("VTI".into(), top(&[("Apple Inc", 0.06)]));

        let rows = FundHoldingsNormalizer::new(&stub).normalize(&funds(&["VGT", "SPYG", "VTI"])).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fund_ticker, "VTI");
    }

    #[tokio::test]
    async fn equity_lookup_failure_drops_only_that_fund() {
        let mut stub = StubProvider::default();
        stub.top.insert("IVV".into(), top(&[("Apple Inc", 0.07)]));
        stub.equity_failing.insert("IVV".into());
        stub.top.insert("VUG".into(), top(&[("Microsoft Corp", 0.12)]));
        stub.equity.insert("VUG".into(), equity(&[("Microsoft Corp", "MSFT")]));

        let rows = FundHoldingsNormalizer::new(&stub).normalize(&funds(&["IVV", "VUG"])).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fund_ticker, "VUG");
        assert_eq!(rows[0].constituent_ticker.as_deref(), Some("MSFT"));
    }
}
