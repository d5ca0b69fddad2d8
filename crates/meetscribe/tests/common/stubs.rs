//! Provider and toolkit stand-ins that record how the pipeline drives them.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use meetscribe::generation::{
    GenerationParams, ProviderError, ProviderErrorKind, TextGenerationProvider,
};
use meetscribe::media::{MediaError, MediaToolkit};

/// Reply long enough to pass content validation when fed back into generation.
pub fn reply(n: u32) -> String {
    format!(
        "Summary {}: the team agreed on scope, owners, deadlines and the review cadence for the next delivery milestone.",
        n
    )
}

enum Behavior {
    Reply,
    Script(Vec<Result<String, ProviderError>>),
    BlockUntil(Arc<Semaphore>),
}

/// Text generation stub. Every prompt is recorded in call order.
pub struct RecordingProvider {
    behavior: Behavior,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl RecordingProvider {
    /// Answers every call with [`reply`].
    pub fn replying() -> Arc<Self> {
        Self::with(Behavior::Reply)
    }

    /// Replays `script`, repeating its last entry once exhausted.
    pub fn scripted(script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        assert!(!script.is_empty(), "script needs at least one outcome");
        Self::with(Behavior::Script(script))
    }

    /// Fails every call as overloaded.
    pub fn overloaded() -> Arc<Self> {
        Self::scripted(vec![Err(ProviderError::new(
            ProviderErrorKind::Overloaded,
            "model overloaded",
        ))])
    }

    /// Parks each call until `gate` hands out a permit, then replies.
    pub fn blocking(gate: Arc<Semaphore>) -> Arc<Self> {
        Self::with(Behavior::BlockUntil(gate))
    }

    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.behavior {
            Behavior::Reply => Ok(reply(n + 1)),
            Behavior::Script(script) => script[(n as usize).min(script.len() - 1)].clone(),
            Behavior::BlockUntil(gate) => {
                gate.acquire()
                    .await
                    .expect("gate semaphore closed")
                    .forget();
                Ok(reply(n + 1))
            }
        }
    }
}

/// Media toolkit for environments without ffmpeg: every operation fails.
pub struct NoMedia;

#[async_trait]
impl MediaToolkit for NoMedia {
    async fn probe_duration(&self, _input: &Path) -> Result<Duration, MediaError> {
        Err(MediaError::InvalidDuration("no ffmpeg in tests".to_string()))
    }

    async fn extract_audio(&self, _input: &Path, _output: &Path) -> Result<u64, MediaError> {
        Err(MediaError::InvalidDuration("no ffmpeg in tests".to_string()))
    }

    async fn cut_segment(
        &self,
        _input: &Path,
        _start: Duration,
        _length: Duration,
        _output: &Path,
    ) -> Result<(), MediaError> {
        Err(MediaError::InvalidDuration("no ffmpeg in tests".to_string()))
    }
}
