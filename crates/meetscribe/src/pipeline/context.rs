use crate::artifact::Artifact;
use crate::generation::{GenerationRequest, Language};
use crate::worker::job::{JobKind, ProcessingRequest};

/// Everything one job run needs, loaded before the pipeline starts.
pub struct PipelineContext {
    pub meeting_id: i64,
    pub job_id: i64,
    pub kind: JobKind,
    pub language: Language,

    /// `None` when the meeting has no attached file.
    pub artifact: Option<Artifact>,

    /// Resolved text of the stored business context, if one was requested.
    pub business_context: Option<String>,
}

impl PipelineContext {
    pub fn new(job_id: i64, request: &ProcessingRequest, artifact: Option<Artifact>) -> Self {
        Self {
            meeting_id: request.meeting_id,
            job_id,
            kind: request.kind,
            language: request.language,
            artifact,
            business_context: None,
        }
    }

    pub fn with_business_context(mut self, context: Option<String>) -> Self {
        self.business_context = context;
        self
    }

    pub fn generation_request(&self, content: String) -> GenerationRequest {
        let request = GenerationRequest::new(content, self.kind, self.language);
        match &self.business_context {
            Some(context) => request.with_business_context(context.clone()),
            None => request,
        }
    }
}
