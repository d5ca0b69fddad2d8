//! Per-job execution: strategy selection, extraction, generation and
//! progress reporting.

pub mod context;
pub mod progress;
pub mod runner;

pub use context::PipelineContext;
pub use progress::{
    BroadcastProgress, JobPhase, JobProgressBroadcaster, JobProgressEvent, NoopProgress,
    ProgressEvent, ProgressReporter,
};
pub use runner::{JobPipeline, PipelineOutput, Strategy};
