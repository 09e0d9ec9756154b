use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{error, trace};

/// Extension shared by every dated report.
pub const REPORT_EXTENSION: &str = "md";

lazy_static::lazy_static! {
    /// Dated report file names, e.g. `2024-01-10.md`. Matching the shape says nothing about
    /// whether the date itself is valid; see [`report_date`].
    pub static ref REPORT_NAME: regex::Regex =
        regex::Regex::new(r"^\d{4}-\d{2}-\d{2}\.md$").expect("valid report name pattern");
}

/// Reads a `.json` file from `path`.
pub async fn read_json<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> anyhow::Result<T> {
    let path = path.as_ref();
    trace!("reading file path: {}", path.display());
    let file = tokio::fs::read(path).await.map_err(|err| {
        error!("failed to read file at {}, error({err})", path.display());
        err
    })?;
    trace!("file read; deserializing bytes ...");
    let data: T = serde_json::from_slice(&file).map_err(|err| {
        error!("failed to parse JSON at {}, error({err})", path.display());
        err
    })?;
    Ok(data)
}

/// Replace the file at `path` with `contents`, by writing a sibling temporary file and renaming
/// it over the target; readers see either the old file or the new one, never half of it.
pub async fn write_atomic(path: impl AsRef<Path>, contents: &str) -> anyhow::Result<()> {
    let path = path.as_ref();
    let tmp = tmp_path(path);

    trace!("writing {} bytes to {}", contents.len(), tmp.display());
    tokio::fs::write(&tmp, contents).await.map_err(|err| {
        error!("failed to write {}, error({err})", tmp.display());
        err
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|err| {
        error!(
            "failed to move {} to {}, error({err})",
            tmp.display(),
            path.display()
        );
        err
    })?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// File name of the report for `date`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("{}.{REPORT_EXTENSION}", date.format("%Y-%m-%d"))
}

/// The date a report file name stands for; `None` for names that are not dated reports, or that
/// have the right shape but no such calendar day.
pub fn report_date(file_name: &str) -> Option<NaiveDate> {
    if !REPORT_NAME.is_match(file_name) {
        return None;
    }
    let stem = file_name.strip_suffix(&format!(".{REPORT_EXTENSION}"))?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Names of every file in `dir` shaped like a dated report, in no particular order. The directory
/// is created if it does not exist yet.
pub async fn list_reports(dir: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await.map_err(|err| {
        error!("failed to create directory {}, error({err})", dir.display());
        err
    })?;

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if REPORT_NAME.is_match(name) {
            names.push(name.to_string());
        } else {
            trace!("ignoring {name} in {}", dir.display());
        }
    }

    Ok(names)
}
