mod server;
mod wav;

use clap::{Args, Parser, Subcommand};
use log::info;
use rtty_core::{
    AfskModulator, DetectionConfig, ModulationConfig, Receiver, DEFAULT_BAUD_RATE,
    DEFAULT_MARK_FREQ, DEFAULT_SHIFT, DEFAULT_SUBSAMPLE_FACTOR, DEFAULT_THRESHOLD, SAMPLE_RATE,
    TEST_MESSAGE,
};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rtty")]
#[command(about = "RTTY modem: Baudot text over AFSK audio, to WAV and back")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Tone plan shared by transmit and receive
#[derive(Args, Debug, Clone)]
struct ToneArgs {
    /// Mark tone in Hz
    #[arg(long, default_value_t = DEFAULT_MARK_FREQ)]
    mark: f32,

    /// Mark/space shift in Hz
    #[arg(long, default_value_t = DEFAULT_SHIFT)]
    shift: f32,

    /// Symbol rate
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: f64,

    /// Space tone above the mark tone
    #[arg(long)]
    reverse: bool,
}

impl ToneArgs {
    fn modulation(&self, amplitude: f32) -> ModulationConfig {
        ModulationConfig {
            mark_frequency: self.mark,
            shift: self.shift,
            baud_rate: self.baud,
            reverse: self.reverse,
            amplitude,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a text file to a WAV audio file
    Encode {
        /// Input text file ("-" for stdin)
        #[arg(value_name = "INPUT.TXT")]
        input: PathBuf,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        #[command(flatten)]
        tones: ToneArgs,

        /// Peak amplitude (0.0 - 1.0)
        #[arg(long, default_value_t = 1.0)]
        amplitude: f32,

        /// Output sample rate in Hz
        #[arg(long, default_value_t = SAMPLE_RATE)]
        sample_rate: u32,
    },

    /// Decode a WAV audio file to text
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Output text file (stdout when omitted)
        #[arg(value_name = "OUTPUT.TXT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        tones: ToneArgs,

        /// Minimum tone magnitude for a mark/space decision
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,

        /// Raw samples per decoder step
        #[arg(long, default_value_t = DEFAULT_SUBSAMPLE_FACTOR)]
        subsample: usize,

        /// Samples fed to the receiver per call
        #[arg(long, default_value_t = 4096)]
        block_size: usize,
    },

    /// Write the RYRY/CQ test transmission (reverse shift) to a WAV file
    TestMessage {
        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Output sample rate in Hz
        #[arg(long, default_value_t = SAMPLE_RATE)]
        sample_rate: u32,
    },

    /// Serve the encoder and decoder over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve { .. }) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Commands::Encode {
            input,
            output,
            tones,
            amplitude,
            sample_rate,
        } => encode_command(&input, &output, &tones.modulation(amplitude), sample_rate)?,
        Commands::Decode {
            input,
            output,
            tones,
            threshold,
            subsample,
            block_size,
        } => {
            let config = DetectionConfig {
                threshold,
                subsample_factor: subsample,
                ..DetectionConfig::from(&tones.modulation(1.0))
            };
            decode_command(&input, output.as_deref(), config, block_size)?
        }
        Commands::TestMessage { output, sample_rate } => test_message_command(&output, sample_rate)?,
        Commands::Serve { bind } => serve_command(bind)?,
    }

    Ok(())
}

fn encode_command(
    input_path: &Path,
    output_path: &Path,
    config: &ModulationConfig,
    sample_rate: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = if input_path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(input_path)?
    };
    println!("Read {} characters from {}", text.chars().count(), input_path.display());

    let modulator = AfskModulator::with_sample_rate(config.clone(), sample_rate as f32)?;
    let samples = modulator.modulate(&text)?;
    println!(
        "Encoded to {} audio samples ({:.2} s at {} Hz, mark {} Hz, space {} Hz)",
        samples.len(),
        samples.len() as f32 / sample_rate as f32,
        sample_rate,
        config.mark_frequency,
        config.space_frequency()
    );

    wav::write_file(output_path, &samples, sample_rate)?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

fn decode_command(
    input_path: &Path,
    output_path: Option<&Path>,
    config: DetectionConfig,
    block_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if block_size == 0 {
        return Err("block size must be at least 1".into());
    }

    let recording = wav::read_file(input_path)?;
    info!(
        "Read WAV: {} Hz, {} channels, {} bits, {:.2} s",
        recording.sample_rate,
        recording.channels,
        recording.bits_per_sample,
        recording.duration_secs()
    );

    let mut receiver = Receiver::with_sample_rate(config, recording.sample_rate as f32)?;
    let mut text = String::new();
    for block in recording.samples.chunks(block_size) {
        receiver.process(block, &mut text);
    }
    info!("Decoded {} characters", text.chars().count());

    match output_path {
        Some(path) => {
            std::fs::write(path, &text)?;
            println!("Decoded {} characters to {}", text.chars().count(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

fn test_message_command(output_path: &Path, sample_rate: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = ModulationConfig {
        reverse: true,
        ..ModulationConfig::default()
    };
    let modulator = AfskModulator::with_sample_rate(config, sample_rate as f32)?;
    let samples = modulator.modulate(TEST_MESSAGE)?;
    wav::write_file(output_path, &samples, sample_rate)?;
    println!(
        "Wrote test message ({} samples) to {}",
        samples.len(),
        output_path.display()
    );
    Ok(())
}

fn serve_command(bind: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rtty=info,tower_http=info")),
        )
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::run(bind))
}
