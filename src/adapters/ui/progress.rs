//! Progress bar for the scoring pass.

use indicatif::{ProgressBar, ProgressStyle};

/// Bar with position, ETA and the title of the last finished conversation.
pub fn scoring_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} (eta {eta}) {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=>-");
    bar.set_style(style);
    bar
}

/// Hidden bar for non-interactive runs and tests.
pub fn hidden_bar() -> ProgressBar {
    ProgressBar::hidden()
}
