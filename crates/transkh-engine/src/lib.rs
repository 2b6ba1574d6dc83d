pub mod engine_trait;
pub mod host;
pub mod http_engine;
pub mod null_engine;
pub mod registry;
pub mod synthesizer;
pub mod transcriber;

pub use engine_trait::{SpeechSynthesis, SpeechToText};
pub use host::{SynthesizerHost, TranscriberHost};
pub use http_engine::{HttpSynthesizer, HttpTranscriber};
pub use null_engine::{NullSynthesizer, NullTranscriber};
pub use registry::EngineRegistry;
pub use synthesizer::SpeechSynthesizer;
pub use transcriber::PrimaryTranscriber;
