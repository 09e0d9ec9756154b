use crate::config::Config;
use crate::fetch::{Fetcher, Transport};
use serde::de::{IgnoredAny, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, trace};

// resolve
// ----------------------------------------------------------------------------

/// Fetch the SEC's ticker to CIK map. It is rebuilt on every run and never cached.
pub async fn resolve<T: Transport>(
    fetcher: &Fetcher<T>,
    config: &Config,
) -> anyhow::Result<CikMap> {
    let time = std::time::Instant::now();

    debug!("fetching SEC Company Tickers");
    let ciks: CikMap = fetcher
        .fetch_json(&config.tickers_url)
        .await
        .map_err(|err| {
            error!("failed to fetch SEC Company Tickers, error({err})");
            err
        })?;

    debug!(
        "{} SEC Company Tickers resolved. {}",
        ciks.len(),
        crate::time_elapsed(time)
    );
    Ok(ciks)
}

// de
// ----------------------------------------------------------------------------

/// Ticker symbol (upper case) to Central Index Key.
///
/// When the source lists a ticker more than once, the entry read last wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CikMap(HashMap<String, u64>);

impl CikMap {
    pub fn get(&self, ticker: &str) -> Option<u64> {
        self.0.get(ticker).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct CikMapVisitor;

impl<'de> Visitor<'de> for CikMapVisitor {
    type Value = CikMap;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("Map of tickers")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        // each entry is in the form of:
        // `"0": { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
        //  "1": { ... },
        //  ...`
        let mut ciks = HashMap::new();
        while let Some((_, row)) = map.next_entry::<IgnoredAny, Value>()? {
            match parse_row(&row) {
                Some((ticker, cik)) => {
                    ciks.insert(ticker, cik);
                }
                None => trace!("skipping malformed ticker row: {row}"),
            }
        }
        Ok(CikMap(ciks))
    }
}

impl<'de> Deserialize<'de> for CikMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // keys are positional indices ("0", "1", ...) carrying no meaning, so only the rows are
        // kept, keyed again by their ticker
        deserializer.deserialize_map(CikMapVisitor)
    }
}

// a row needs a non-empty ticker and a positive CIK, either of which may arrive as a number or
// a string
fn parse_row(row: &Value) -> Option<(String, u64)> {
    let ticker = match row.get("ticker")? {
        Value::String(ticker) => ticker.trim().to_uppercase(),
        Value::Number(ticker) => ticker.to_string(),
        _ => return None,
    };
    let cik = match row.get("cik_str")? {
        Value::Number(cik) => cik.as_u64()?,
        Value::String(cik) => cik.trim().parse().ok()?,
        _ => return None,
    };

    if ticker.is_empty() || cik == 0 {
        return None;
    }
    Some((ticker, cik))
}
