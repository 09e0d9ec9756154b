#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracker_spider::config::Config;
use tracker_spider::fetch::{FetchError, RawResponse, Transport};

/// Serves canned responses per URL, in order, and records every request. A URL without a
/// response left answers 404.
#[derive(Default)]
pub struct Routes {
    responses: Mutex<HashMap<String, VecDeque<RawResponse>>>,
    requests: Mutex<Vec<String>>,
}

impl Routes {
    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(RawResponse::new(status, body));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for Routes {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| RawResponse::new(404, "not found"));
        Ok(response)
    }
}

/// Default config rooted in `root`, without the courtesy throttle.
pub fn config_in(root: &Path) -> Config {
    Config {
        tickers_path: root.join("config/tickers.json"),
        reports_dir: root.join("reports"),
        index_path: root.join("index.md"),
        throttle: Duration::ZERO,
        ..Config::default()
    }
}

pub fn write_registry(config: &Config, json: &str) {
    std::fs::create_dir_all(config.tickers_path.parent().unwrap()).unwrap();
    std::fs::write(&config.tickers_path, json).unwrap();
}

pub const COMPANY_TICKERS: &str = r#"{
    "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
    "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"}
}"#;

pub const AAPL_SUBMISSIONS: &str = r#"{
    "cik": "320193",
    "name": "Apple Inc.",
    "filings": {
        "recent": {
            "accessionNumber": ["0000320193-24-000006", "0000320193-23-000001"],
            "filingDate": ["2024-01-10", "2023-01-01"],
            "form": ["10-K", "8-K"],
            "primaryDocument": ["aapl-20231230.htm", "aapl-8k.htm"]
        }
    }
}"#;

pub const AAPL_SUBMISSIONS_URL: &str = "https://data.sec.gov/submissions/CIK0000320193.json";
pub const MSFT_SUBMISSIONS_URL: &str = "https://data.sec.gov/submissions/CIK0000789019.json";
pub const TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
