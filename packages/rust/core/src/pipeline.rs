//! Progress reporting shared by the batch jobs.

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document has been read and matched.
    fn document_scanned(&self, filename: &str, current: usize, total: usize);
    /// Called after each unnotified contract has been checked.
    fn contract_checked(&self, filename: &str, current: usize, total: usize);
    /// Called when the batch completes.
    fn finish(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_scanned(&self, _filename: &str, _current: usize, _total: usize) {}
    fn contract_checked(&self, _filename: &str, _current: usize, _total: usize) {}
    fn finish(&self) {}
}
