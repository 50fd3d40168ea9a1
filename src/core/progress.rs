//! Progress reporting for long-running rasterization passes.
//!
//! Progress is an observer, not part of correctness: the rasterizers call
//! `begin`/`tick`/`end` and never depend on what the observer does. A pass
//! with zero steps is never started.

use indicatif::{ProgressBar, ProgressStyle};

pub trait ProgressObserver {
    /// Start a pass of `total` steps. `total` is never zero.
    fn begin(&mut self, label: &str, total: u64);

    /// One step done.
    fn tick(&mut self);

    /// Pass finished.
    fn end(&mut self);
}

/// Observer that does nothing. Used by tests and library callers.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn begin(&mut self, _label: &str, _total: u64) {}
    fn tick(&mut self) {}
    fn end(&mut self) {}
}

/// Console observer drawing an indicatif bar per pass.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ProgressObserver for ConsoleProgress {
    fn begin(&mut self, label: &str, total: u64) {
        debug_assert!(total > 0, "progress pass started with an empty range");
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:>24}: [{bar:40.green/blue}] {pos}/{len} ({percent}%)")
                .expect("progress template is valid")
                .progress_chars("█▉▊▋▌▍▎▏"),
        );
        bar.set_message(label.to_owned());
        self.bar = Some(bar);
    }

    fn tick(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn end(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
