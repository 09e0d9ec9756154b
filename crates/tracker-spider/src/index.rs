use std::path::Path;
use tracing::debug;

/// Regenerate the index at `index_path` from the dated reports currently in `reports_dir`,
/// returning the listed file names, newest first.
pub async fn rebuild(
    reports_dir: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
) -> anyhow::Result<Vec<String>> {
    let reports_dir = reports_dir.as_ref();
    let index_path = index_path.as_ref();

    let mut names = crate::fs::list_reports(reports_dir).await?;
    // YYYY-MM-DD sorts lexicographically in date order
    names.sort_unstable_by(|a, b| b.cmp(a));

    let contents = render(&names, &link_prefix(reports_dir, index_path)?);
    crate::fs::write_atomic(index_path, &contents).await?;

    debug!(
        "index {} rebuilt with {} reports",
        index_path.display(),
        names.len()
    );
    Ok(names)
}

/// Markdown for the index; `names` are listed in the order given.
pub fn render(names: &[String], link_prefix: &str) -> String {
    let mut lines = vec!["# SEC Filing Tracker Reports".to_string(), String::new()];
    for name in names {
        let date = name
            .strip_suffix(&format!(".{}", crate::fs::REPORT_EXTENSION))
            .unwrap_or(name);
        lines.push(format!("- [{date}]({link_prefix}/{name})"));
    }
    lines.push(String::new());
    lines.join("\n")
}

// where `reports_dir` sits as seen from the directory holding the index; markdown links always
// use forward slashes
fn link_prefix(reports_dir: &Path, index_path: &Path) -> anyhow::Result<String> {
    let cwd = std::env::current_dir()?;
    let reports_dir = cwd.join(reports_dir);
    let index_dir = cwd.join(index_path.parent().unwrap_or(Path::new("")));

    let relative = pathdiff::diff_paths(&reports_dir, &index_dir).unwrap_or(reports_dir);
    let prefix = relative.to_string_lossy().replace('\\', "/");
    if prefix.is_empty() {
        return Ok(".".to_string());
    }
    Ok(prefix)
}
