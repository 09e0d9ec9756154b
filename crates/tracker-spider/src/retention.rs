use anyhow::Context;
use chrono::{NaiveDate, TimeDelta};
use std::path::{Path, PathBuf};
use tracing::{error, info, trace};

/// Delete dated reports in `dir` older than `today - keep_days`; a report dated exactly on the
/// boundary is kept. Returns the deleted paths.
///
/// Only names shaped like `YYYY-MM-DD.md` are considered, and of those only the ones that are
/// real calendar dates; anything else is left alone.
pub async fn sweep(
    dir: impl AsRef<Path>,
    today: NaiveDate,
    keep_days: i64,
) -> anyhow::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let oldest_kept = TimeDelta::try_days(keep_days)
        .and_then(|keep| today.checked_sub_signed(keep))
        .with_context(|| {
            format!("keeping {keep_days} days of reports reaches past the supported date range")
        })?;

    let mut names = crate::fs::list_reports(dir).await?;
    names.sort_unstable();

    let mut deleted = Vec::new();
    for name in names {
        let Some(dated) = crate::fs::report_date(&name) else {
            trace!("{name} is not a valid date; leaving it in place");
            continue;
        };
        if dated >= oldest_kept {
            continue;
        }

        let path = dir.join(&name);
        tokio::fs::remove_file(&path).await.map_err(|err| {
            error!("failed to delete {}, error({err})", path.display());
            err
        })?;
        info!("deleted expired report {}", path.display());
        deleted.push(path);
    }

    Ok(deleted)
}
