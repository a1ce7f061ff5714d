use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth::config::Config;
use hearth::speech;

/// Hearth - hands-free voice commands for Home Assistant
#[derive(Parser)]
#[command(name = "hearth", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "HEARTH_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Directory holding the speech model
    #[arg(long, env = "HEARTH_MODELS_DIR", default_value = "models")]
    models_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe a WAV file and print the recognized utterances
    Transcribe {
        /// Path to a 16-bit mono WAV file
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(command) = cli.command {
        return match command {
            Command::Transcribe { path } => transcribe(&cli.models_dir, &path),
        };
    }

    info!("Starting Hearth voice assistant");

    let config = Config::load(&cli.config)?;
    listen(&cli.models_dir, &config)
}

#[cfg(feature = "audio-io")]
fn listen(models_dir: &Path, config: &Config) -> anyhow::Result<()> {
    use crossbeam_channel::unbounded;
    use hearth::answer;
    use hearth::audio::AudioCapture;
    use hearth::homeassistant::{ActionSink, HomeAssistant};
    use hearth::producer::UtteranceProducer;
    use hearth::session::Session;
    use std::sync::Arc;

    let engine = speech::create_engine(
        models_dir,
        &config.options.vosk_model_download_url,
        config.options.vosk_samplerate,
    )?;

    let sink: Arc<dyn ActionSink> = Arc::new(HomeAssistant::new(&config.options)?);
    let answers = answer::create_backend(config)?;
    let session = Session::new(config, sink, answers);

    let (frames_tx, frames_rx) = unbounded();
    let (utterances_tx, utterances_rx) = unbounded();

    let mut capture = AudioCapture::new(config.options.vosk_samplerate)?;
    let _producer = UtteranceProducer::new(frames_rx, utterances_tx, engine).start();
    capture.start(frames_tx)?;

    info!("Listening, say an activation phrase to begin");
    session.run(utterances_rx);
    Ok(())
}

#[cfg(not(feature = "audio-io"))]
fn listen(_models_dir: &Path, _config: &Config) -> anyhow::Result<()> {
    anyhow::bail!("this build has no audio input; rebuild with the audio-io feature")
}

/// Feed a recording through the speech engine frame by frame.
///
/// Useful for checking a model before wiring up the microphone.
fn transcribe(models_dir: &Path, path: &Path) -> anyhow::Result<()> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 {
        anyhow::bail!(
            "expected 16-bit mono WAV, got {}-bit with {} channel(s)",
            spec.bits_per_sample,
            spec.channels
        );
    }

    let mut engine = speech::create_engine(models_dir, "", spec.sample_rate)?;
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()?;

    info!(
        "Transcribing {} samples at {} Hz",
        samples.len(),
        spec.sample_rate
    );
    for frame in samples.chunks(8000) {
        if let Some(text) = engine.accept_frame(frame)? {
            println!("{}", text);
        }
    }
    if let Some(text) = engine.finalize()? {
        println!("{}", text);
    }
    Ok(())
}
