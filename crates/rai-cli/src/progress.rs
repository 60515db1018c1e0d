//! Progress bars for model loads and downloads.

use indicatif::{ProgressBar, ProgressStyle};
use rai_coach::{CoachError, CoachSession};
use std::future::Future;

/// Bar measured in percent with a free-text message.
pub(crate) fn percent_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb
}

pub(crate) fn percent(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u64
}

/// Drive a bar from the session state while `load` runs.
pub(crate) async fn track_load<F>(session: &CoachSession, load: F) -> Result<(), CoachError>
where
    F: Future<Output = Result<(), CoachError>>,
{
    let pb = percent_bar();
    let mut rx = session.subscribe();
    let bar = pb.clone();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            bar.set_position(percent(state.progress_fraction));
            bar.set_message(state.progress_label);
        }
    });

    let result = load.await;
    watcher.abort();

    let state = session.state();
    pb.set_position(percent(state.progress_fraction));
    pb.finish_with_message(state.progress_label);
    result
}
