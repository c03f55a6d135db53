// Error taxonomy for a single-shot run. Only capture failure aborts the run;
// everything zone-scoped is either recovered with a diagnostic or surfaces as
// a `CommandError` local to that zone.

use thiserror::Error;

use crate::core_modules::zones::ZoneId;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The frame source produced nothing; fatal, no output is written.
    #[error("frame capture produced no image")]
    CaptureFailure,

    /// Persisting run state (color file) failed.
    #[error("state persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// Persisting the previous-frame snapshot failed.
    #[error("frame snapshot persistence failed: {0}")]
    Snapshot(#[from] image::ImageError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The zone id falls outside the fixed payload-template table.
    #[error("zone {zone} has no payload template (valid ids are 1..=20)")]
    ZoneOutOfRange { zone: ZoneId },
}
