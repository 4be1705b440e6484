//! Phase spinner with CI fallback

use super::context::UiContext;
use crate::orchestrator::{Phase, Reporter};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner that follows an operation's phases
///
/// Interactive terminals get an indicatif spinner whose message tracks the
/// current phase. Otherwise each phase is printed as its own line.
pub struct PhaseProgress {
    bar: Option<ProgressBar>,
    label: String,
}

impl PhaseProgress {
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new_spinner();
            let template = ProgressStyle::with_template(
                "  {spinner:.blue} {prefix:.bold} {msg:.dim}  {elapsed:.dim}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
            bar.set_style(template);
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("{}...", label);
            None
        };

        Self {
            bar,
            label: label.to_string(),
        }
    }

    /// Stop and clear the spinner
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

impl Reporter for PhaseProgress {
    fn phase(&self, phase: Phase, detail: &str) {
        match (&self.bar, phase) {
            (Some(bar), _) => bar.set_message(format!("{}: {}", phase, shorten(detail))),
            // Failures are reported once by the caller
            (None, Phase::Aborted) => {}
            (None, _) => println!("  {} {}", style(format!("[{}]", phase)).dim(), detail),
        }
    }
}

impl Drop for PhaseProgress {
    fn drop(&mut self) {
        if let Some(ref bar) = self.bar {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
        tracing::trace!("{} progress closed", self.label);
    }
}

fn shorten(detail: &str) -> String {
    const MAX: usize = 60;
    if detail.chars().count() <= MAX {
        return detail.to_string();
    }
    let tail: String = detail
        .chars()
        .rev()
        .take(MAX - 3)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = PhaseProgress::new(&ctx, "Fetching");
        progress.phase(Phase::Fingerprinted, "abc");
        progress.phase(Phase::Aborted, "boom");
        progress.finish();
    }

    #[test]
    fn shorten_keeps_short_detail() {
        assert_eq!(shorten("vendor/bundle"), "vendor/bundle");
    }

    #[test]
    fn shorten_keeps_the_tail() {
        let long = format!("https://s3.amazonaws.com/deps/{}", "x".repeat(80));
        let short = shorten(&long);
        assert_eq!(short.chars().count(), 60);
        assert!(short.starts_with("..."));
        assert!(short.ends_with("xxx"));
    }
}
