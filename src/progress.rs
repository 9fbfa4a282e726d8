//! Progress reporting utilities using indicatif.
//!
//! The scanner reports through the [`ProgressCallback`] trait; [`Progress`]
//! renders it as a terminal progress bar for interactive text output.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for a column scan.
pub trait ProgressCallback: Send + Sync {
    /// Called once before the first row.
    ///
    /// # Arguments
    ///
    /// * `file` - Display name of the file being scanned
    /// * `total_rows` - Expected number of data rows (may be an estimate)
    fn on_scan_start(&self, file: &str, total_rows: usize);

    /// Called after each row.
    ///
    /// # Arguments
    ///
    /// * `current` - Rows processed so far (1-based)
    fn on_row(&self, current: usize);

    /// Called when a row had to be skipped.
    fn on_warning(&self, _message: &str) {}

    /// Called once after the last row.
    fn on_scan_end(&self);
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn row_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, file: &str, total_rows: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total_rows as u64);
        pb.set_style(Self::row_style());
        pb.set_message(truncate_name(file, 30));
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_row(&self, current: usize) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| pb.set_position(current as u64));
    }

    fn on_warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| pb.println(format!("warning: {message}")));
    }

    fn on_scan_end(&self) {
        if self.quiet {
            return;
        }
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

/// Shorten a file name for the progress bar message.
fn truncate_name(name: &str, max_chars: usize) -> String {
    let count = name.chars().count();
    if count <= max_chars {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max_chars - 3)).collect();
    format!("...{tail}")
}
