use crate::config::Config;
use crate::fetch::{Fetcher, Transport};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, error, trace};

// scrape
// ----------------------------------------------------------------------------

/// Reportable filings for the filer `cik`, dated on or after `cutoff`, newest first.
pub async fn filings_for<T: Transport>(
    fetcher: &Fetcher<T>,
    config: &Config,
    cik: u64,
    cutoff: NaiveDate,
) -> anyhow::Result<Vec<Filing>> {
    let url = config.submissions_url_for(cik);

    trace!("fetching submissions for CIK {cik}");
    let submissions: Submissions = fetcher.fetch_json(&url).await.map_err(|err| {
        error!("failed to fetch submissions for CIK {cik}, error({err})");
        err
    })?;

    let rows = submissions.into_rows();
    let filings = select(&rows, cik, cutoff, config);
    debug!(
        "CIK {cik}: {} of {} recent filings selected",
        filings.len(),
        rows.len()
    );

    Ok(filings)
}

/// Keep the rows worth reporting and turn them into [`Filing`]s, newest first.
///
/// A row survives when its form is one of `config.forms`, its date parses as `YYYY-MM-DD` and is
/// not before `cutoff`, and it names both an accession number and a primary document. Filings on
/// the same date keep their source order.
pub fn select(rows: &[RawFiling], cik: u64, cutoff: NaiveDate, config: &Config) -> Vec<Filing> {
    let mut filings: Vec<Filing> = rows
        .iter()
        .filter_map(|row| {
            let form = row.form.trim();
            if !config.forms.contains(form) {
                return None;
            }

            let filed = match NaiveDate::parse_from_str(row.filing_date.trim(), "%Y-%m-%d") {
                Ok(filed) => filed,
                Err(err) => {
                    trace!("skipping {form} with date {:?}, error({err})", row.filing_date);
                    return None;
                }
            };
            if filed < cutoff {
                return None;
            }

            let accession = row.accession_number.trim();
            let primary_document = row.primary_document.trim();
            if accession.is_empty() || primary_document.is_empty() {
                trace!("skipping {form} filed {filed}: no accession number or document");
                return None;
            }

            Some(Filing {
                form: form.to_string(),
                filed,
                url: config.archive_url(cik, accession, primary_document),
            })
        })
        .collect();

    // newest first; sort_by is stable
    filings.sort_by(|a, b| b.filed.cmp(&a.filed));
    filings
}

// model
// ----------------------------------------------------------------------------

/// A filing worth reporting, with a direct link to its primary document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filing {
    pub form: String,
    pub filed: NaiveDate,
    pub url: String,
}

/// One position across the parallel arrays of `filings.recent`, uninterpreted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFiling {
    pub form: String,
    pub filing_date: String,
    pub accession_number: String,
    pub primary_document: String,
}

// de
// ----------------------------------------------------------------------------

/// The parts of `CIK##########.json` this crate reads.
#[derive(Debug, Default, Deserialize)]
pub struct Submissions {
    #[serde(default)]
    filings: Option<FilingHistory>,
}

#[derive(Debug, Default, Deserialize)]
struct FilingHistory {
    #[serde(default)]
    recent: Option<Recent>,
}

// each field is an array, indexed by filing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recent {
    #[serde(default, deserialize_with = "de_strings")]
    form: Vec<String>,
    #[serde(default, deserialize_with = "de_strings")]
    filing_date: Vec<String>,
    #[serde(default, deserialize_with = "de_strings")]
    accession_number: Vec<String>,
    #[serde(default, deserialize_with = "de_strings")]
    primary_document: Vec<String>,
}

impl Submissions {
    /// Zip the parallel arrays into rows, stopping at the shortest one.
    pub fn into_rows(self) -> Vec<RawFiling> {
        let recent = self
            .filings
            .and_then(|history| history.recent)
            .unwrap_or_default();

        recent
            .form
            .into_iter()
            .zip(recent.filing_date)
            .zip(recent.accession_number)
            .zip(recent.primary_document)
            .map(
                |(((form, filing_date), accession_number), primary_document)| RawFiling {
                    form,
                    filing_date,
                    accession_number,
                    primary_document,
                },
            )
            .collect()
    }
}

// null arrays read as empty, null elements as "", other scalars as their JSON text
fn de_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|value| match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect())
}
