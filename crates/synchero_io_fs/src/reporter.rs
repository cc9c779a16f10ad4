//! Per-file notification side channel.

use tracing::info;

use crate::spec::SpecMergeEvent;

/// Receives one event per copy/skip decision.
///
/// Events are observational only. With a worker pool, sibling subdirectories
/// report from different threads, hence the `Sync` bound.
pub trait MergeReporter: Sync {
    /// Called after the decision for one file has been applied.
    fn report_entry(&self, event: &SpecMergeEvent);
}

impl<F> MergeReporter for F
where
    F: Fn(&SpecMergeEvent) + Sync,
{
    fn report_entry(&self, event: &SpecMergeEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReporterSilent;

impl MergeReporter for ReporterSilent {
    fn report_entry(&self, _event: &SpecMergeEvent) {}
}

/// Emits every event as an `info` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReporterTracing;

impl MergeReporter for ReporterTracing {
    fn report_entry(&self, event: &SpecMergeEvent) {
        info!(
            outcome = event.outcome.as_str(),
            "{} -> {}",
            event.name_file,
            event.path_file_dst.display()
        );
    }
}
