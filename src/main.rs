use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aria_assistant::audio::{AudioPlayback, FrameSource, MicSource};
use aria_assistant::tts::SpeechAudio;
use aria_assistant::{Assistant, Config, TextToSpeech};

/// Aria - voice assistant pipeline
#[derive(Parser)]
#[command(name = "aria", version, about)]
struct Cli {
    /// Path to a config TOML file (defaults to the platform config dir)
    #[arg(short, long, env = "ARIA_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Synthesize and speak a line of text
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Classify a line of text and show intent, confidence, and entities
    Classify {
        /// Text to classify
        text: String,
    },
    /// Chat over stdin/stdout without audio hardware
    Chat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,aria_assistant=info",
        1 => "info,aria_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(&config, duration),
            Command::TestSpeaker => test_speaker().await,
            Command::Say { text } => say(&config, &text).await,
            Command::Classify { text } => classify(config, &text).await,
            Command::Chat => chat(config).await,
        };
    }

    tracing::info!("starting aria");
    let assistant = Assistant::new(config)?;
    assistant.run().await?;

    Ok(())
}

/// Test microphone input with a live level meter
fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut mic = MicSource::start(&config.audio)?;
    let frame_ms = config.audio.frame_duration().as_millis().max(1);
    #[allow(clippy::cast_possible_truncation)]
    let frames = ((u128::from(duration) * 1000) / frame_ms) as usize;

    println!("Sample rate: {} Hz", mic.sample_rate());
    println!("---");

    for _ in 0..frames {
        let Some(frame) = mic.read_frame()? else {
            break;
        };

        let rms = frame.rms();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = ((rms / 100.0).min(50.0)) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);
        let speech = if rms > config.audio.energy_threshold {
            "SPEECH"
        } else {
            "      "
        };

        println!("RMS: {rms:8.1} {speech} [{meter}]");
    }

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working.");
    println!("If RMS stayed near 0, check your input device levels.");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = 24_000_u32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    playback.play(samples, sample_rate).await?;

    println!("If you heard the tone, your speakers are working.");
    Ok(())
}

/// Synthesize and speak one line
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Speaking: \"{text}\"");

    let tts = TextToSpeech::from_config(&config.tts)?;
    let playback = AudioPlayback::new()?;

    match tts.synthesize(text).await? {
        SpeechAudio::Wav(bytes) => playback.play_wav(&bytes).await?,
        SpeechAudio::Mp3(bytes) => playback.play_mp3(&bytes).await?,
    }

    Ok(())
}

/// Classify one line and print what the NLP core understood
async fn classify(config: Config, text: &str) -> anyhow::Result<()> {
    let assistant = Assistant::new(config)?;
    let exchange = assistant.respond(text).await?;

    println!("Input:      \"{text}\"");
    println!(
        "Intent:     {} (confidence: {:.2})",
        exchange.intent, exchange.confidence
    );
    println!("Entities:   {:?}", exchange.entities);
    println!("Response:   {}", exchange.response);

    Ok(())
}

/// Text chat loop over stdin/stdout
async fn chat(config: Config) -> anyhow::Result<()> {
    use std::io::{BufRead, Write};

    let assistant = Assistant::new(config)?;

    println!("Aria text chat. Type 'exit' to quit.\n");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit" | "stop") {
            break;
        }

        let exchange = assistant.respond(line).await?;
        println!(
            "[{} {:.2}] {}",
            exchange.intent, exchange.confidence, exchange.response
        );

        if exchange.intent == aria_assistant::Intent::Goodbye {
            break;
        }
    }

    println!("Bye!");
    Ok(())
}
