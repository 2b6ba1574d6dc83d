use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use transkh_core::{AppConfig, Command, InboundMessage};
use transkh_engine::{
    EngineRegistry, PrimaryTranscriber, SpeechSynthesizer, SynthesizerHost, TranscriberHost,
};
use transkh_pipeline::{MessageOutcome, PipelineOrchestrator};
use transkh_remote::{FallbackAsrClient, TranslationClient};
use transkh_reply::SinkRegistry;

#[derive(Parser)]
#[command(name = "transkh", about = "English <-> Khmer voice and text translation")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    message: Message,
}

#[derive(Subcommand)]
enum Message {
    /// Process a voice message (WAV file)
    Voice { path: PathBuf },
    /// Process a text message; `/start` and `/help` are treated as commands
    Text { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;
    let config = Arc::new(config);

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing::info!("transkh starting");

    let inbound = match cli.message {
        Message::Voice { path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read voice message {:?}", path))?;
            InboundMessage::Voice(bytes)
        }
        Message::Text { text } => match Command::parse(&text) {
            Some(command) => InboundMessage::Command(command),
            None => InboundMessage::Text(text),
        },
    };

    let orchestrator = build_orchestrator(&config).await?;

    let sinks = SinkRegistry::new();
    let sink = sinks
        .build(&config.reply.sink, config.reply.extra.clone())
        .await
        .with_context(|| format!("failed to create reply sink '{}'", config.reply.sink))?;

    let outcome = orchestrator.handle(inbound, sink.as_ref()).await;

    tracing::info!("shutting down");
    orchestrator.shutdown().await;
    if let Err(e) = sink.shutdown().await {
        tracing::warn!("reply sink shutdown failed: {e}");
    }

    match outcome {
        MessageOutcome::Run(run) => match run.failure() {
            Some(failure) => bail!(
                "run {} failed at stage {}: {}",
                run.run_id(),
                failure.stage,
                failure.message
            ),
            None => tracing::info!(run_id = %run.run_id(), "done"),
        },
        MessageOutcome::Command(command) => tracing::info!(?command, "command answered"),
    }
    Ok(())
}

async fn build_orchestrator(config: &AppConfig) -> Result<PipelineOrchestrator> {
    let registry = EngineRegistry::new();
    let timeout = config.engines.timeout();

    let transcriber = registry
        .build_transcriber(&config.transcriber)
        .await
        .with_context(|| {
            format!(
                "failed to create transcriber with engine '{}'",
                config.transcriber.engine
            )
        })?;
    tracing::info!("transcriber engine '{}' active", config.transcriber.engine);

    let english = registry
        .build_synthesizer(&config.synthesis.english)
        .await
        .with_context(|| {
            format!(
                "failed to create English synthesizer with engine '{}'",
                config.synthesis.english.engine
            )
        })?;
    let khmer = registry
        .build_synthesizer(&config.synthesis.khmer)
        .await
        .with_context(|| {
            format!(
                "failed to create Khmer synthesizer with engine '{}'",
                config.synthesis.khmer.engine
            )
        })?;
    tracing::info!(
        english_rate = english.sample_rate(),
        khmer_rate = khmer.sample_rate(),
        "synthesis engines '{}' / '{}' active",
        config.synthesis.english.engine,
        config.synthesis.khmer.engine
    );

    let translator =
        TranslationClient::new(&config.translation).context("failed to create translation client")?;
    let fallback = FallbackAsrClient::new(&config.fallback_asr);
    tracing::info!(
        translation_url = %translator.url(),
        fallback_url = %fallback.url(),
        "remote services configured"
    );

    Ok(PipelineOrchestrator::new(
        PrimaryTranscriber::new(TranscriberHost::spawn(transcriber, timeout)),
        Box::new(fallback),
        Box::new(translator),
        SpeechSynthesizer::new(
            SynthesizerHost::spawn(english, timeout),
            SynthesizerHost::spawn(khmer, timeout),
        ),
        config.general.scratch_dir.clone(),
    ))
}
