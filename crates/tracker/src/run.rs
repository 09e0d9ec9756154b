use tracker_spider::config::Config;
use tracker_spider::fetch::{Fetcher, HttpTransport};
use tracker_spider::pipeline;
use tracing::{debug, error, info, trace};

/// Run the tracker once against the live SEC endpoints.
pub(crate) async fn run(tui: bool) -> anyhow::Result<()> {
    let time = std::time::Instant::now();

    let config = Config::from_env().map_err(|err| {
        error!("invalid configuration, error({err})");
        err
    })?;
    trace!("configuration loaded: {config:?}");

    let transport = HttpTransport::new(&config)?;
    let fetcher = Fetcher::new(transport, config.retry.clone());
    debug!("http client built for {}", config.user_agent);

    let outcome = pipeline::run(&fetcher, &config, chrono::Utc::now(), tui).await?;

    info!(
        "report {} written, {} reports indexed, {} expired reports deleted, time elapsed: {:?}",
        outcome.report.display(),
        outcome.indexed.len(),
        outcome.deleted.len(),
        time.elapsed()
    );

    if tui {
        println!("report written to {}", outcome.report.display());
        for path in &outcome.deleted {
            println!("deleted {}", path.display());
        }
    }

    Ok(())
}
