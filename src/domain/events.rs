//! Progress reporting seam between the engine and whoever is watching

use crate::domain::reports::ProgressUpdate;

/// Receives progress while a compare or sync run is in flight.
///
/// Implementations must not block; updates may arrive from concurrent tasks.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _update: ProgressUpdate) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update);
    }
}
