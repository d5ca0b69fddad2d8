pub mod job;
pub mod orchestrator;

pub use job::{JobKind, JobResult, JobStatus, MeetingStatus, ProcessingRequest};
pub use orchestrator::{JobOrchestrator, MeetingSnapshot};
