use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} transcription failed: {message}")]
    Failed {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} transcript not ready after {polls} polls")]
    PollLimit { provider: &'static str, polls: u32 },
}
