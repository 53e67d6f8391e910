// src/services/price.rs
use log::{debug, warn};

use super::provider::MarketDataProvider;

/// Best-effort current price: the fast quote first, then the close of the
/// latest one-day history bar. Failures are logged and never propagated.
pub struct PriceResolver<'a> {
    provider: &'a dyn MarketDataProvider,
}

impl<'a> PriceResolver<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider) -> Self {
        PriceResolver { provider }
    }

    pub async fn resolve(&self, ticker: &str) -> Option<f64> {
        match self.provider.last_price(ticker).await {
            Ok(Some(price)) if price.is_finite() => return Some(price),
            Ok(_) => debug!("No last price for {}, falling back to daily history", ticker),
            Err(e) => warn!("Last price lookup failed for {}: {}. Falling back to daily history", ticker, e),
        }

        match self.provider.daily_history(ticker).await {
            Ok(bars) => {
                let close = bars
                    .iter()
                    .rev()
                    .find_map(|bar| bar.close.filter(|c| c.is_finite()));
                if close.is_none() {
                    warn!("Empty daily history for {}, price unavailable", ticker);
                }
                close
            }
            Err(e) => {
                warn!("Daily history lookup failed for {}: {}. Price unavailable", ticker, e);
                None
            }
        }
    }
}
