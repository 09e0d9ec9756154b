pub mod config;
pub mod fetch;
pub mod fs;
pub mod index;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod retention;

/// Company tickers and filing histories from the [SEC].
///
/// [SEC]: https://www.sec.gov/search-filings/edgar-application-programming-interfaces
pub mod sec;

pub(crate) mod tui;

/// Shortcut for required API elements.
pub(crate) mod http {
    pub(crate) use dotenv::var;
    pub(crate) use reqwest::Client as HttpClient;
}

/// Formats the time elapsed since `time` for log lines.
pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:?}", time.elapsed())
}
