use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress over `len` tickers; hidden unless running in tui mode.
pub(crate) fn progress_bar(len: usize, tui: bool) -> anyhow::Result<ProgressBar> {
    if !tui {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(len as u64).with_style(
        ProgressStyle::default_bar()
            .template(
                "{msg} {spinner:.magenta}\n\
                [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} \
                [Rate: {per_sec:.magenta}, ETA: {eta:.blue}]",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("collecting filings ...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
