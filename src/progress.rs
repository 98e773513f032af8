//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for batch runs. Safe to share across worker threads.
#[derive(Debug)]
pub struct ProgressReporter {
    pub jobs_pb: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Create progress reporter for a batch of `total` comparisons
    pub fn new_for_batch(total: u64) -> Self {
        Self {
            jobs_pb: Some(create_progress_bar(total, "Comparing")),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self { jobs_pb: None }
    }

    /// Record one finished comparison
    pub fn job_finished(&self, name: &str) {
        if let Some(pb) = &self.jobs_pb {
            pb.inc(1);
            pb.set_message(name.to_string());
        }
    }

    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.jobs_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.jobs_pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a progress bar with known total
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")
            .expect("Invalid progress template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
