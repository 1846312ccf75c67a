//! Console progress output for download runs.
//!
//! One [`ProgressReporter`] is shared by the coordinator and every fetch task.
//! It owns an indicatif [`MultiProgress`] so per-file byte bars, the batch bar
//! and plain message lines (retry notices, per-outcome summaries) can be drawn
//! together without tearing each other.

use std::sync::{Arc, Mutex, PoisonError};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const FILE_BAR_TEMPLATE: &str =
    "{msg:30} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
const FILE_SPINNER_TEMPLATE: &str = "{spinner} {msg:30} {bytes} ({bytes_per_sec})";
const BATCH_BAR_TEMPLATE: &str = "{msg} [{bar:40.green/white}] {pos}/{len} files ({elapsed})";

#[derive(Debug, Clone)]
enum MessageSink {
    /// Lines go to stdout (through the multi-bar when bars are drawn).
    Console,
    /// Lines are dropped.
    Silent,
    /// Lines are kept in memory.
    Capture(Arc<Mutex<Vec<String>>>),
}

/// Progress bars and operator-facing message lines.
///
/// Cloning shares the same multi-bar and message sink.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    multi: MultiProgress,
    bars_visible: bool,
    messages: MessageSink,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::hidden()
    }
}

impl ProgressReporter {
    /// Creates a reporter writing to the terminal.
    ///
    /// With `show_bars` false no bar is drawn but message lines are still printed.
    #[must_use]
    pub fn console(show_bars: bool) -> Self {
        let multi = if show_bars {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        // A multi-bar without a terminal swallows println output.
        let bars_visible = show_bars && !multi.is_hidden();
        Self {
            multi,
            bars_visible,
            messages: MessageSink::Console,
        }
    }

    /// Creates a reporter that draws nothing and prints nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            bars_visible: false,
            messages: MessageSink::Silent,
        }
    }

    /// Creates a reporter that draws nothing and records message lines.
    ///
    /// Recorded lines are available through [`ProgressReporter::messages`].
    #[must_use]
    pub fn capturing() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            bars_visible: false,
            messages: MessageSink::Capture(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Returns `true` when bars are drawn to the terminal.
    #[must_use]
    pub fn bars_visible(&self) -> bool {
        self.bars_visible
    }

    /// Lines recorded by a [`ProgressReporter::capturing`] reporter, oldest first.
    ///
    /// Empty for every other reporter.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match &self.messages {
            MessageSink::Capture(lines) => lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            MessageSink::Console | MessageSink::Silent => Vec::new(),
        }
    }

    /// Prints one operator-facing line above any active bars.
    pub fn println(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        match &self.messages {
            MessageSink::Console if self.bars_visible => {
                if self.multi.println(line).is_err() {
                    println!("{line}");
                }
            }
            MessageSink::Console => println!("{line}"),
            MessageSink::Silent => {}
            MessageSink::Capture(lines) => lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(line.to_string()),
        }
    }

    /// Adds a byte-count bar for one file transfer.
    ///
    /// `total_bytes` of 0 means the size is unknown; a spinner counting bytes is
    /// shown instead of a bar.
    #[must_use]
    pub fn file_bar(&self, display_name: &str, total_bytes: u64) -> ProgressBar {
        let (bar, template) = if total_bytes == 0 {
            (ProgressBar::new_spinner(), FILE_SPINNER_TEMPLATE)
        } else {
            (ProgressBar::new(total_bytes), FILE_BAR_TEMPLATE)
        };
        bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(display_name.to_string());
        self.multi.add(bar)
    }

    /// Adds the completed-versus-total bar for a batch of downloads.
    #[must_use]
    pub fn batch_bar(&self, total_tasks: u64) -> ProgressBar {
        let bar = ProgressBar::new(total_tasks);
        bar.set_style(
            ProgressStyle::with_template(BATCH_BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message("Downloading files");
        self.multi.add(bar)
    }
}
