use crate::config::{Config, RunDates};
use crate::fetch::{Fetcher, Transport};
use crate::registry::{self, Ticker};
use crate::report::{self, Results};
use crate::sec::submissions::filings_for;
use crate::sec::tickers::CikMap;
use crate::{index, retention, sec};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// What a completed run left on disk.
#[derive(Debug)]
pub struct Outcome {
    pub dates: RunDates,
    pub report: PathBuf,
    /// Reports listed in the index, newest first.
    pub indexed: Vec<String>,
    /// Reports removed by the retention sweep.
    pub deleted: Vec<PathBuf>,
}

/// One full run: registry, CIK map, filings per ticker, then report, index and retention sweep.
///
/// Nothing is written until every fetch has succeeded, so a failed run leaves the previous
/// reports and index exactly as they were.
pub async fn run<T: Transport>(
    fetcher: &Fetcher<T>,
    config: &Config,
    now: DateTime<Utc>,
    tui: bool,
) -> anyhow::Result<Outcome> {
    let dates = config.run_dates(now)?;
    info!(
        "tracking filings since {} for report {}",
        dates.cutoff, dates.today
    );

    let tickers = registry::load(&config.tickers_path).await?;
    let ciks = sec::tickers::resolve(fetcher, config).await?;
    let results = collect(fetcher, config, &tickers, &ciks, dates.cutoff, tui).await?;

    let report_path = report::write(
        &config.reports_dir,
        dates.today,
        &tickers,
        &results,
        config.lookback_days,
    )
    .await?;
    info!("report written to {}", report_path.display());

    let mut indexed = index::rebuild(&config.reports_dir, &config.index_path).await?;
    let deleted = retention::sweep(&config.reports_dir, dates.today, config.keep_days).await?;
    if !deleted.is_empty() {
        // keep the index in step with what the sweep left behind
        indexed = index::rebuild(&config.reports_dir, &config.index_path).await?;
    }

    Ok(Outcome {
        dates,
        report: report_path,
        indexed,
        deleted,
    })
}

/// Filings for every ticker, fetched one filer at a time with `config.throttle` between
/// requests. Tickers the CIK map does not know get an empty list and no request.
pub async fn collect<T: Transport>(
    fetcher: &Fetcher<T>,
    config: &Config,
    tickers: &[Ticker],
    ciks: &CikMap,
    cutoff: NaiveDate,
    tui: bool,
) -> anyhow::Result<Results> {
    let time = std::time::Instant::now();
    let pb = crate::tui::progress_bar(tickers.len(), tui)?;

    let mut results = Results::new();
    let mut requested = false;
    for ticker in tickers {
        pb.set_message(format!("[{}] {}", ticker.ticker, ticker.name));

        let Some(cik) = ciks.get(&ticker.ticker) else {
            debug!(
                "[{}] {} has no CIK; not covered by EDGAR",
                ticker.ticker, ticker.name
            );
            results.insert(ticker.ticker.clone(), Vec::new());
            pb.inc(1);
            continue;
        };

        if requested {
            tokio::time::sleep(config.throttle).await;
        }
        requested = true;

        let filings = filings_for(fetcher, config, cik, cutoff)
            .await
            .map_err(|err| {
                error!(
                    "failed to collect filings for [{}] {}, error({err})",
                    ticker.ticker, ticker.name
                );
                pb.abandon();
                err
            })?;
        debug!(
            "[{}] {}: {} filings since {cutoff}",
            ticker.ticker,
            ticker.name,
            filings.len()
        );
        results.insert(ticker.ticker.clone(), filings);
        pb.inc(1);
    }

    pb.finish_and_clear();
    debug!(
        "filings collected for {} tickers. {}",
        tickers.len(),
        crate::time_elapsed(time)
    );

    if tui {
        println!("collecting filings ... done");
    }

    Ok(results)
}
