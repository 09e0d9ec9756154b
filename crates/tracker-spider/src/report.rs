use crate::registry::Ticker;
use crate::sec::submissions::Filing;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Filings per ticker symbol, as collected in one run.
pub type Results = HashMap<String, Vec<Filing>>;

/// Write (or overwrite) the report for `report_date` into `dir`, returning its path.
///
/// Writing the same inputs twice produces the same bytes.
pub async fn write(
    dir: impl AsRef<Path>,
    report_date: NaiveDate,
    tickers: &[Ticker],
    results: &Results,
    lookback_days: i64,
) -> anyhow::Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await.map_err(|err| {
        error!("failed to create report directory {}, error({err})", dir.display());
        err
    })?;

    let path = dir.join(crate::fs::report_file_name(report_date));
    let contents = render(report_date, tickers, results, lookback_days);
    crate::fs::write_atomic(&path, &contents).await?;

    debug!("report written to {}", path.display());
    Ok(path)
}

/// Markdown for one report: a section per ticker, in registry order.
pub fn render(
    report_date: NaiveDate,
    tickers: &[Ticker],
    results: &Results,
    lookback_days: i64,
) -> String {
    let mut lines = vec![
        format!("# SEC Filing Tracker — {}", report_date.format("%Y-%m-%d")),
        String::new(),
    ];

    for ticker in tickers {
        lines.push(format!("## {} — {}", ticker.ticker, ticker.name));
        match results.get(&ticker.ticker) {
            Some(filings) if !filings.is_empty() => {
                for filing in filings {
                    lines.push(format!(
                        "- {} | Filed: {} | 🔗 [Link]({})",
                        filing.form,
                        filing.filed.format("%Y-%m-%d"),
                        filing.url
                    ));
                }
            }
            _ => lines.push(format!("_No new filings in last {lookback_days} days_")),
        }
        lines.push(String::new());
    }

    let mut contents = lines.join("\n").trim_end().to_string();
    contents.push('\n');
    contents
}
