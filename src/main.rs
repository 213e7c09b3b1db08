use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use fobrx::keyfob::{DecodedRecord, DecoderConfig, KeyfobDecoder, KeyfobEncoder};
use fobrx::utils::consts::*;
use fobrx::utils::io as sample_io;
use fobrx::utils::logging::init_logging;

#[derive(Parser)]
#[command(author, version, about = "OOK keyfob receiver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode keyfob packets from a WAV file or raw f32le sample stream
    Decode {
        /// Input path; "-" reads raw f32le samples from stdin
        #[arg(short, long)]
        input: String,
        /// Sample rate for raw input (WAV headers override this)
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f32,
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,
        #[arg(long, default_value_t = DEFAULT_BITRATE_MIN)]
        bitrate_min: f32,
        #[arg(long, default_value_t = DEFAULT_BITRATE_MAX)]
        bitrate_max: f32,
        #[arg(long, default_value_t = DEFAULT_BITRATE_NOMINAL)]
        bitrate: f32,
        #[arg(long, default_value_t = DEFAULT_BITRATE_STEP)]
        bitrate_step: f32,
        /// Emit one JSON object per record instead of "ref addr switches"
        #[arg(long)]
        json: bool,
    },
    /// Generate a synthetic keyfob transmission as a WAV file
    Synth {
        #[arg(short, long)]
        output: PathBuf,
        /// 10-bit transmitter address
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(0..1024))]
        address: u16,
        /// 8-bit switch states
        #[arg(short = 'w', long, default_value_t = 0)]
        switches: u8,
        #[arg(long, default_value_t = DEFAULT_BITRATE_NOMINAL)]
        bitrate: f32,
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f32,
        #[arg(long, default_value_t = 0.9)]
        amplitude: f32,
        /// Number of packet repeats
        #[arg(short, long, default_value_t = 1)]
        repeat: usize,
    },
}

fn main() -> io::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            input,
            sample_rate,
            threshold,
            bitrate_min,
            bitrate_max,
            bitrate,
            bitrate_step,
            json,
        } => {
            let config = DecoderConfig {
                sample_rate,
                threshold,
                bitrate_min,
                bitrate_max,
                bitrate_nominal: bitrate,
                bitrate_step,
            };
            run_decode(&input, config, json)
        }
        Commands::Synth {
            output,
            address,
            switches,
            bitrate,
            sample_rate,
            amplitude,
            repeat,
        } => run_synth(
            &output, address, switches, bitrate, sample_rate, amplitude,
            repeat,
        ),
    }
}

fn run_decode(input: &str, mut config: DecoderConfig, json: bool) -> io::Result<()> {
    let is_wav = input != "-"
        && Path::new(input)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    let (tx, rx) = crossbeam_channel::unbounded::<DecodedRecord>();
    let mut sink = tx;

    if is_wav {
        let (samples, wav_rate) = sample_io::read_wav(Path::new(input))?;
        if wav_rate as f32 != config.sample_rate {
            info!("using WAV header sample rate {} Hz", wav_rate);
            config.sample_rate = wav_rate as f32;
        }
        validate_or_exit(&config);
        let mut decoder = KeyfobDecoder::new(config);

        let bar = ProgressBar::new(samples.len() as u64);
        for chunk in samples.chunks(65_536) {
            decoder.process_samples(chunk, &mut sink);
            bar.inc(chunk.len() as u64);
            drain_records(&rx, json);
        }
        decoder.finish(&mut sink);
        bar.finish_and_clear();
        drain_records(&rx, json);
        return Ok(());
    }

    validate_or_exit(&config);
    let mut decoder = KeyfobDecoder::new(config);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        }) {
            warn!("could not install Ctrl-C handler: {}", err);
        }
    }

    let mut reader: Box<dyn Read> = if input == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(BufReader::new(File::open(input)?))
    };

    let mut chunk = Vec::new();
    while running.load(Ordering::SeqCst) {
        let read = sample_io::read_f32_chunk(&mut reader, &mut chunk, 16_384)?;
        if read == 0 {
            break;
        }
        decoder.process_samples(&chunk, &mut sink);
        drain_records(&rx, json);
    }
    decoder.finish(&mut sink);
    drain_records(&rx, json);
    info!(
        "stream ended after {} samples, clock settled at {:.0} baud",
        decoder.stream_position(),
        decoder.clock().bitrate
    );
    Ok(())
}

fn drain_records(
    rx: &crossbeam_channel::Receiver<DecodedRecord>,
    json: bool,
) {
    for record in rx.try_iter() {
        if json {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!("could not serialize record: {}", err),
            }
        } else {
            println!(
                "{} {} {}",
                record.reference_level, record.address, record.switches
            );
        }
    }
}

fn validate_or_exit(config: &DecoderConfig) {
    if let Err(err) = config.validate() {
        eprintln!("invalid receiver configuration: {err}");
        std::process::exit(1);
    }
}

fn run_synth(
    output: &Path,
    address: u16,
    switches: u8,
    bitrate: f32,
    sample_rate: f32,
    amplitude: f32,
    repeat: usize,
) -> io::Result<()> {
    let encoder = KeyfobEncoder::new(sample_rate, bitrate, amplitude);
    let mut signal = Vec::new();
    for _ in 0..repeat.max(1) {
        signal.extend(encoder.encode_burst(address, switches, 8, 24));
    }
    sample_io::write_wav(&signal, sample_rate as u32, output)?;
    info!(
        "wrote {} samples ({} packet(s), address={:#06x} switches={:#04x}) \
         to {}",
        signal.len(),
        repeat.max(1),
        address,
        switches,
        output.display()
    );
    Ok(())
}
