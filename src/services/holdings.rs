// src/services/holdings.rs
use anyhow::{anyhow, Context, Result};
use csv::Reader;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::models::HoldingInput;

pub const TICKER_COLUMN: &str = "Ticker";
pub const SHARES_COLUMN: &str = "Number of stocks";

/// Reads the holdings list from a CSV file.
pub fn load_holdings(path: &Path) -> Result<Vec<HoldingInput>> {
    info!("Reading holdings from {}", path.display());
    let rdr = Reader::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_holdings(rdr)
}

/// Parses holdings rows. Rows without a usable ticker or share count are skipped;
/// repeated tickers are merged into the first occurrence by summing shares.
pub fn read_holdings<R: Read>(mut rdr: Reader<R>) -> Result<Vec<HoldingInput>> {
    let headers = rdr.headers()?.clone();
    let idx_ticker = headers
        .iter()
        .position(|h| h.trim() == TICKER_COLUMN)
        .ok_or_else(|| anyhow!("No '{}' column in holdings CSV", TICKER_COLUMN))?;
    let idx_shares = headers
        .iter()
        .position(|h| h.trim() == SHARES_COLUMN)
        .ok_or_else(|| anyhow!("No '{}' column in holdings CSV", SHARES_COLUMN))?;

    let ticker_re = Regex::new(r"^\^?[A-Z0-9][A-Z0-9.\-=]*$")?;

    let mut holdings: Vec<HoldingInput> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (line, record) in rdr.records().enumerate() {
        let row = record?;
        // Header is line 1
        let line = line + 2;

        let ticker = row.get(idx_ticker).unwrap_or("").trim().to_uppercase();
        let shares_cell = row.get(idx_shares).unwrap_or("").trim();
        if ticker.is_empty() || shares_cell.is_empty() {
            debug!("Skipping line {}: missing ticker or share count", line);
            continue;
        }
        if !ticker_re.is_match(&ticker) {
            warn!("Skipping line {}: {:?} is not a valid ticker", line, ticker);
            continue;
        }
        let share_count = match shares_cell.replace(',', "").parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 => n,
            _ => {
                warn!("Skipping line {}: invalid share count {:?} for {}", line, shares_cell, ticker);
                continue;
            }
        };

        match positions.get(&ticker) {
            Some(&pos) => {
                warn!("{} listed more than once, adding {} shares", ticker, share_count);
                holdings[pos].share_count += share_count;
            }
            None => {
                positions.insert(ticker.clone(), holdings.len());
                holdings.push(HoldingInput { ticker, share_count });
            }
        }
    }

    info!("Loaded {} holdings", holdings.len());
    Ok(holdings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<HoldingInput>> {
        read_holdings(Reader::from_reader(text.as_bytes()))
    }

    #[test]
    fn drops_incomplete_and_invalid_rows() {
        let text = "Ticker,Number of stocks,Notes\n\
                    voo,12,core\n\
                    ,5,no ticker\n\
                    MSFT,,no shares\n\
                    KO,abc,bad number\n\
                    PG,-3,negative\n\
                    BRK.B,\"1,200\",ok\n\
                    $$$,4,bad ticker\n";
        let holdings = parse(text).unwrap();
        assert_eq!(
            holdings,
            vec![
                HoldingInput { ticker: "VOO".into(), share_count: 12.0 },
                HoldingInput { ticker: "BRK.B".into(), share_count: 1200.0 },
            ]
        );
    }

    #[test]
    fn duplicate_tickers_are_merged() {
        let holdings = parse("Number of stocks,Ticker\n2,NVDA\n1.5,SCHD\n3,nvda\n").unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0], HoldingInput { ticker: "NVDA".into(), share_count: 5.0 });
        assert_eq!(holdings[1].ticker, "SCHD");
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = parse("Symbol,Number of stocks\nVOO,1\n").unwrap_err();
        assert!(err.to_string().contains("Ticker"));
    }

    #[test]
    fn index_symbols_keep_leading_caret() {
        let holdings = parse("Ticker,Number of stocks\n^GSPC,1\nES=F,2\n$$$,3\nA^B,4\n^,5\n").unwrap();
        let tickers: Vec<&str> = holdings.iter().map(|h| h.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["^GSPC", "ES=F"]);
    }
}
