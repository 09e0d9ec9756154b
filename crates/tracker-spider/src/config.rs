use crate::fetch::RetryPolicy;
use crate::http::var;
use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// The SEC rejects traffic that does not identify itself; the last whitespace separated token
/// doubles as the `From` header.
pub const DEFAULT_USER_AGENT: &str = "SEC-Filing-Tracker admin@example.com";

/// Filing form types worth reporting.
pub const DEFAULT_FORMS: [&str; 5] = ["10-K", "10-Q", "20-F", "8-K", "6-K"];

const TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const SUBMISSIONS_URL: &str = "https://data.sec.gov/submissions";
const ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";

/// Upper bound for the lookback and retention windows, about a century.
pub const MAX_DAYS: i64 = 36_500;

// Asia/Taipei; no daylight saving
const UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Everything a run needs to know, fixed for its whole duration and handed to each component by
/// reference.
#[derive(Clone, Debug)]
pub struct Config {
    pub user_agent: String,
    pub forms: BTreeSet<String>,
    pub tickers_path: PathBuf,
    pub reports_dir: PathBuf,
    pub index_path: PathBuf,
    pub tickers_url: String,
    pub submissions_url: String,
    pub archives_url: String,
    /// How far back a filing may be dated and still be reported.
    pub lookback_days: i64,
    /// How long a dated report survives before the sweeper removes it.
    pub keep_days: i64,
    pub utc_offset: FixedOffset,
    pub request_timeout: Duration,
    /// Pause between successive per-filer requests.
    pub throttle: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            forms: DEFAULT_FORMS.iter().map(|form| form.to_string()).collect(),
            tickers_path: PathBuf::from("config/tickers.json"),
            reports_dir: PathBuf::from("reports"),
            index_path: PathBuf::from("index.md"),
            tickers_url: TICKERS_URL.to_string(),
            submissions_url: SUBMISSIONS_URL.to_string(),
            archives_url: ARCHIVES_URL.to_string(),
            lookback_days: 30,
            keep_days: 30,
            utc_offset: FixedOffset::east_opt(UTC_OFFSET_SECS).expect("valid UTC offset"),
            request_timeout: Duration::from_secs(30),
            throttle: Duration::from_millis(200),
            retry: RetryPolicy::default(),
        }
    }
}

/// The two calendar dates a run is anchored to, both in the configured timezone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunDates {
    /// Names the report file, and anchors the retention window.
    pub today: NaiveDate,
    /// Oldest filing date that still makes it into the report.
    pub cutoff: NaiveDate,
}

impl Config {
    /// Defaults, overridden by any of the following environment variables (or `.env` entries):
    /// `USER_AGENT`, `TRACKER_TICKERS_PATH`, `TRACKER_REPORTS_DIR`, `TRACKER_INDEX_PATH`,
    /// `TRACKER_LOOKBACK_DAYS`, `TRACKER_KEEP_DAYS`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(user_agent) = var("USER_AGENT") {
            debug!("USER_AGENT read from environment");
            config.user_agent = user_agent;
        }
        if let Ok(path) = var("TRACKER_TICKERS_PATH") {
            config.tickers_path = PathBuf::from(path);
        }
        if let Ok(path) = var("TRACKER_REPORTS_DIR") {
            config.reports_dir = PathBuf::from(path);
        }
        if let Ok(path) = var("TRACKER_INDEX_PATH") {
            config.index_path = PathBuf::from(path);
        }
        if let Ok(days) = var("TRACKER_LOOKBACK_DAYS") {
            config.lookback_days = parse_days("TRACKER_LOOKBACK_DAYS", &days)?;
        }
        if let Ok(days) = var("TRACKER_KEEP_DAYS") {
            config.keep_days = parse_days("TRACKER_KEEP_DAYS", &days)?;
        }

        Ok(config)
    }

    /// Contact address taken from the user agent, sent as the `From` header.
    pub fn contact(&self) -> &str {
        self.user_agent
            .split_whitespace()
            .last()
            .unwrap_or(self.user_agent.as_str())
    }

    /// Submission history document for a filer; the CIK is zero-padded to 10 digits.
    pub fn submissions_url_for(&self, cik: u64) -> String {
        format!("{}/CIK{cik:010}.json", self.submissions_url)
    }

    /// Direct link to a filing's primary document.
    pub fn archive_url(&self, cik: u64, accession: &str, primary_document: &str) -> String {
        format!(
            "{}/{cik}/{}/{primary_document}",
            self.archives_url,
            accession.replace('-', "")
        )
    }

    /// Report date and filing cutoff for a run started at `now`, computed in the configured
    /// timezone whatever the host's own timezone is.
    pub fn run_dates(&self, now: DateTime<Utc>) -> anyhow::Result<RunDates> {
        let local = now.with_timezone(&self.utc_offset);
        let cutoff = TimeDelta::try_days(self.lookback_days)
            .and_then(|lookback| local.checked_sub_signed(lookback))
            .with_context(|| {
                format!(
                    "lookback of {} days reaches past the supported date range",
                    self.lookback_days
                )
            })?;

        Ok(RunDates {
            today: local.date_naive(),
            cutoff: cutoff.date_naive(),
        })
    }
}

fn parse_days(key: &str, value: &str) -> anyhow::Result<i64> {
    let days: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of days, got {value:?}"))?;
    anyhow::ensure!(days >= 0, "{key} must not be negative, got {days}");
    anyhow::ensure!(days <= MAX_DAYS, "{key} must be at most {MAX_DAYS}, got {days}");
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn contact_is_last_token_of_user_agent() {
        let config = Config {
            user_agent: "Filing Watch ops@example.org".to_string(),
            ..Config::default()
        };
        assert_eq!(config.contact(), "ops@example.org");
    }

    #[test]
    fn submissions_url_pads_cik() {
        let config = Config::default();
        assert_eq!(
            config.submissions_url_for(320193),
            "https://data.sec.gov/submissions/CIK0000320193.json"
        );
    }

    #[test]
    fn archive_url_strips_dashes() {
        let config = Config::default();
        assert_eq!(
            config.archive_url(320193, "0000320193-24-000006", "aapl-20231230.htm"),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019324000006/aapl-20231230.htm"
        );
    }

    #[test]
    fn run_dates_use_fixed_offset() {
        let config = Config::default();

        // 17:30 UTC is already the next day in Taipei
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 17, 30, 0).unwrap();
        let dates = config.run_dates(now).unwrap();
        assert_eq!(dates.today, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(dates.cutoff, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let now = Utc.with_ymd_and_hms(2024, 1, 31, 15, 59, 59).unwrap();
        let dates = config.run_dates(now).unwrap();
        assert_eq!(dates.today, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(dates.cutoff, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn parse_days_rejects_garbage() {
        assert_eq!(parse_days("KEY", " 14 ").unwrap(), 14);
        assert!(parse_days("KEY", "two weeks").is_err());
        assert!(parse_days("KEY", "-1").is_err());
        assert_eq!(parse_days("KEY", "36500").unwrap(), MAX_DAYS);
        assert!(parse_days("KEY", "36501").is_err());
        assert!(parse_days("KEY", "999999999999999").is_err());
    }

    #[test]
    fn run_dates_reject_lookback_past_date_range() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        for lookback_days in [i64::MAX, 999_999_999_999_999, 200_000_000] {
            let config = Config {
                lookback_days,
                ..Config::default()
            };
            assert!(config.run_dates(now).is_err(), "{lookback_days} should fail");
        }
    }
}
