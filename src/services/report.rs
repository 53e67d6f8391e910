// src/services/report.rs
use anyhow::{Context, Result};
use csv::Writer;
use log::info;
use std::io::Write;
use std::path::Path;

use crate::models::{FundHoldingRow, FundReportRow, ReportRow};

use super::portfolio::ReportTable;

pub const PORTFOLIO_COLUMNS: [&str; 16] = [
    "Ticker",
    "Price",
    "Sector",
    "PE Ratio",
    "Market Cap",
    "Beta",
    "Expense Ratio",
    "Number of Stocks",
    "Market value",
    "Growth Class",
    "Type",
    "PE low",
    "PE high",
    "Percentage",
    "eps_CAGR_3y",
    "fcf_CAGR_3y",
];

pub const FUND_COLUMNS: [&str; 4] = ["ETF", "Symbol", "Company Name", "Holding Percent"];

/// Writes the portfolio table. Absent values become empty cells.
pub fn write_portfolio_report<W: Write>(wtr: &mut Writer<W>, table: &ReportTable) -> Result<()> {
    // serialize() emits the header with the first row only
    if table.rows.is_empty() {
        wtr.write_record(PORTFOLIO_COLUMNS)?;
    }
    for holding in &table.rows {
        wtr.serialize(ReportRow::from(holding))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_fund_holdings<W: Write>(wtr: &mut Writer<W>, rows: &[FundHoldingRow]) -> Result<()> {
    if rows.is_empty() {
        wtr.write_record(FUND_COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(FundReportRow::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_portfolio_report(path: &Path, table: &ReportTable) -> Result<()> {
    let mut wtr = Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_portfolio_report(&mut wtr, table)?;
    info!("Saved to {}", path.display());
    Ok(())
}

pub fn save_fund_holdings(path: &Path, rows: &[FundHoldingRow]) -> Result<()> {
    let mut wtr = Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_fund_holdings(&mut wtr, rows)?;
    info!("Saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichedHolding;

    fn render_portfolio(table: &ReportTable) -> String {
        let mut wtr = Writer::from_writer(Vec::new());
        write_portfolio_report(&mut wtr, table).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn portfolio_columns_and_empty_cells() {
        let table = ReportTable {
            rows: vec![
                EnrichedHolding {
                    ticker: "MSFT".into(),
                    price: Some(400.0),
                    sector: Some("Technology".into()),
                    share_count: 2.0,
                    market_value: Some(800.0),
                    growth_class: Some("Core Growth".into()),
                    asset_type: Some("Stock".into()),
                    pe_low: Some(28.0),
                    pe_high: Some(35.0),
                    percentage_of_portfolio: Some(1.0),
                    eps_cagr_3y: Some(0.25),
                    ..EnrichedHolding::default()
                },
                EnrichedHolding { ticker: "KO".into(), share_count: 3.0, ..EnrichedHolding::default() },
            ],
            total_market_value: 800.0,
        };

        let text = render_portfolio(&table);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Ticker,Price,Sector,PE Ratio,Market Cap,Beta,Expense Ratio,Number of Stocks,Market value,\
             Growth Class,Type,PE low,PE high,Percentage,eps_CAGR_3y,fcf_CAGR_3y"
        );
        assert_eq!(lines.next().unwrap(), "MSFT,400.0,Technology,,,,,2.0,800.0,Core Growth,Stock,28.0,35.0,1.0,0.25,");
        assert_eq!(lines.next().unwrap(), "KO,,,,,,,3.0,,,,,,,,");
        assert_eq!(lines.next(), None);

        // Same input, same bytes
        assert_eq!(text, render_portfolio(&table));
    }

    #[test]
    fn fund_columns() {
        let rows = vec![FundHoldingRow {
            fund_ticker: "VOO".into(),
            constituent_ticker: None,
            company_name: "Berkshire Hathaway Inc, Class B".into(),
            holding_percent: 0.017,
        }];
        let mut wtr = Writer::from_writer(Vec::new());
        write_fund_holdings(&mut wtr, &rows).unwrap();
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(text, "ETF,Symbol,Company Name,Holding Percent\nVOO,,\"Berkshire Hathaway Inc, Class B\",0.017\n");
    }

    #[test]
    fn empty_portfolio_still_has_header() {
        let table = ReportTable { rows: Vec::new(), total_market_value: 0.0 };
        let text = render_portfolio(&table);
        assert_eq!(text, format!("{}\n", PORTFOLIO_COLUMNS.join(",")));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stock_fundamentals.csv");
        save_portfolio_report(&out, &table).unwrap();
        let saved = std::fs::read_to_string(&out).unwrap();
        assert!(saved.starts_with("Ticker,Price,Sector,"));
        assert_eq!(saved.trim_end().split(',').count(), 16);
    }

    #[test]
    fn empty_fund_table_still_has_header() {
        let mut wtr = Writer::from_writer(Vec::new());
        write_fund_holdings(&mut wtr, &[]).unwrap();
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(text, "ETF,Symbol,Company Name,Holding Percent\n");
    }
}
