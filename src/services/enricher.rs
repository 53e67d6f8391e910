// src/services/enricher.rs
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::collections::HashMap;

use crate::config::Classifications;
use crate::models::{EnrichedHolding, HoldingInput};

use super::calculations::GrowthRateCalculator;
use super::price::PriceResolver;
use super::provider::{MarketDataProvider, TickerInfo};

/// Builds one `EnrichedHolding` per ticker from the provider and the static tables.
/// No cross-ticker values are computed here.
pub struct HoldingEnricher<'a> {
    provider: &'a dyn MarketDataProvider,
    classifications: &'a Classifications,
    shares: HashMap<String, f64>,
}

impl<'a> HoldingEnricher<'a> {
    pub fn new(
        provider: &'a dyn MarketDataProvider,
        classifications: &'a Classifications,
        holdings: &[HoldingInput],
    ) -> Self {
        let shares = holdings
            .iter()
            .map(|h| (h.ticker.clone(), h.share_count))
            .collect();
        HoldingEnricher { provider, classifications, shares }
    }

    pub async fn enrich(&self, ticker: &str) -> EnrichedHolding {
        info!("Enriching {}", ticker);

        let price = PriceResolver::new(self.provider).resolve(ticker).await;

        let info = match self.provider.info(ticker).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Quote info unavailable for {}: {}", ticker, e);
                TickerInfo::default()
            }
        };

        let growth = GrowthRateCalculator::new(&self.classifications.statement_labels);
        let eps_cagr_3y = growth.eps_cagr_3y(self.provider, ticker).await;
        let fcf_cagr_3y = growth.fcf_cagr_3y(self.provider, ticker).await;

        EnrichedHolding {
            ticker: ticker.to_string(),
            price,
            sector: info.sector,
            pe_ratio: info.trailing_pe,
            market_cap: info.market_cap,
            beta: info.beta,
            expense_ratio: self.classifications.expense_ratio(ticker),
            share_count: self.shares.get(ticker).copied().unwrap_or(0.0),
            eps_cagr_3y,
            fcf_cagr_3y,
            ..EnrichedHolding::default()
        }
    }

    /// Enriches tickers in order. With `concurrency` above one, up to that many
    /// tickers are in flight at once; output order still follows the input.
    pub async fn enrich_all(&self, tickers: &[String], concurrency: usize) -> Vec<EnrichedHolding> {
        stream::iter(tickers)
            .map(|ticker| self.enrich(ticker))
            .buffered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await
    }
}
