//! Single-worker queues around inference engines.
//!
//! Each host spawns one task that owns its engine and serves requests in
//! arrival order, so concurrent callers serialize instead of racing on the
//! engine. Every call is bounded by the host's timeout.

use crate::engine_trait::{SpeechSynthesis, SpeechToText};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use transkh_core::{AudioSample, SynthesisError, TranscriptionError};

struct TranscribeJob {
    audio: AudioSample,
    reply: oneshot::Sender<Result<String, TranscriptionError>>,
}

pub struct TranscriberHost {
    engine_name: String,
    timeout: Duration,
    job_tx: mpsc::UnboundedSender<TranscribeJob>,
    task_handle: JoinHandle<()>,
}

impl TranscriberHost {
    /// Moves an initialized engine onto its worker task.
    pub fn spawn(mut engine: Box<dyn SpeechToText>, timeout: Duration) -> Self {
        let engine_name = engine.name().to_string();
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<TranscribeJob>();
        let name = engine_name.clone();

        let task_handle = tokio::spawn(async move {
            while let Some(job) = job_rx.recv().await {
                // caller already timed out
                if job.reply.is_closed() {
                    tracing::debug!(engine = %name, "skipping abandoned transcription job");
                    continue;
                }
                let result = engine.transcribe(job.audio).await;
                let _ = job.reply.send(result);
            }
            tracing::debug!(engine = %name, "job sender dropped, shutting down");
            if let Err(e) = engine.shutdown().await {
                tracing::warn!(engine = %name, "engine shutdown failed: {e}");
            }
        });

        Self {
            engine_name,
            timeout,
            job_tx,
            task_handle,
        }
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub async fn transcribe(&self, audio: AudioSample) -> Result<String, TranscriptionError> {
        let (reply, reply_rx) = oneshot::channel();
        self.job_tx
            .send(TranscribeJob { audio, reply })
            .map_err(|_| TranscriptionError::WorkerGone)?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TranscriptionError::WorkerGone),
            Err(_) => Err(TranscriptionError::Timeout(self.timeout)),
        }
    }

    /// Closes the queue and waits for the worker to shut its engine down.
    pub async fn shutdown(self) {
        drop(self.job_tx);
        let _ = self.task_handle.await;
    }
}

struct SynthesizeJob {
    text: String,
    reply: oneshot::Sender<Result<Vec<f32>, SynthesisError>>,
}

pub struct SynthesizerHost {
    engine_name: String,
    sample_rate: u32,
    timeout: Duration,
    job_tx: mpsc::UnboundedSender<SynthesizeJob>,
    task_handle: JoinHandle<()>,
}

impl SynthesizerHost {
    /// Moves an initialized engine onto its worker task. The engine's declared
    /// sample rate is captured here and reported for every waveform.
    pub fn spawn(mut engine: Box<dyn SpeechSynthesis>, timeout: Duration) -> Self {
        let engine_name = engine.name().to_string();
        let sample_rate = engine.sample_rate();
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<SynthesizeJob>();
        let name = engine_name.clone();

        let task_handle = tokio::spawn(async move {
            while let Some(job) = job_rx.recv().await {
                if job.reply.is_closed() {
                    tracing::debug!(engine = %name, "skipping abandoned synthesis job");
                    continue;
                }
                let result = engine.synthesize(&job.text).await;
                let _ = job.reply.send(result);
            }
            tracing::debug!(engine = %name, "job sender dropped, shutting down");
            if let Err(e) = engine.shutdown().await {
                tracing::warn!(engine = %name, "engine shutdown failed: {e}");
            }
        });

        Self {
            engine_name,
            sample_rate,
            timeout,
            job_tx,
            task_handle,
        }
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<f32>, SynthesisError> {
        let (reply, reply_rx) = oneshot::channel();
        self.job_tx
            .send(SynthesizeJob {
                text: text.to_string(),
                reply,
            })
            .map_err(|_| SynthesisError::WorkerGone)?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SynthesisError::WorkerGone),
            Err(_) => Err(SynthesisError::Timeout(self.timeout)),
        }
    }

    pub async fn shutdown(self) {
        drop(self.job_tx);
        let _ = self.task_handle.await;
    }
}
