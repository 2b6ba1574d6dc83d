pub mod messages;
pub mod orchestrator;
pub mod run;

pub use orchestrator::{MessageOutcome, PipelineOrchestrator};
pub use run::{PipelineRun, RunFailure, RunKind, RunState, SynthesisSummary};
