use serde_json::Value;
use std::path::Path;
use tracing::{debug, error};

/// One watched company, as configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticker {
    /// Upper-cased, trimmed symbol.
    pub ticker: String,
    pub name: String,
}

/// Load the watchlist at `path`: a JSON array of `{ "ticker": ..., "name": ... }` objects.
///
/// Order is preserved. Entries missing either field are dropped, not reported as errors.
pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Vec<Ticker>> {
    let path = path.as_ref();
    let entries: Vec<Value> = crate::fs::read_json(path).await.map_err(|err| {
        error!("failed to load ticker registry at {}", path.display());
        err
    })?;

    let tickers = normalize(entries);
    debug!("{} tickers loaded from {}", tickers.len(), path.display());
    Ok(tickers)
}

/// Trim and upper-case each entry, keeping only the ones with both a ticker and a name.
pub fn normalize(entries: Vec<Value>) -> Vec<Ticker> {
    entries
        .iter()
        .filter_map(|entry| {
            let ticker = field(entry, "ticker").to_uppercase();
            let name = field(entry, "name");
            if ticker.is_empty() || name.is_empty() {
                debug!("dropping incomplete registry entry: {entry}");
                return None;
            }
            Some(Ticker {
                ticker,
                name: name.to_string(),
            })
        })
        .collect()
}

// absent, non-string and blank fields all read as ""
fn field<'a>(entry: &'a Value, key: &str) -> &'a str {
    entry.get(key).and_then(Value::as_str).unwrap_or("").trim()
}
