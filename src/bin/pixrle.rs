//! pixrle CLI - run-length coding of serialized images and codec analysis.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pixrle::pipeline::{self, PipelineConfig};
use pixrle::serialize::{deserialize, serialize_path};
use pixrle::{compression_ratio, entropy, fidelity, parse_runs, RunStats};
use std::fs;
use std::path::PathBuf;

/// pixrle - run-length codec for image byte streams
#[derive(Parser, Debug)]
#[command(name = "pixrle")]
#[command(author, version, about = "Run-length codec for image byte streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Flatten an image into its RGB byte stream
    Serialize {
        /// Image to read
        image: PathBuf,
        /// Byte stream to write
        output: PathBuf,
    },

    /// Rebuild an image from a byte stream
    Restore {
        /// Byte stream to read
        stream: PathBuf,
        /// Image to write, format taken from the extension
        output: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },

    /// Run-length encode a file
    Encode { input: PathBuf, output: PathBuf },

    /// Decode a run-length encoded file
    Decode { input: PathBuf, output: PathBuf },

    /// List the runs of an encoded file
    Inspect {
        input: PathBuf,
        /// Show at most this many runs
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the metrics of a byte stream
    Stats {
        /// Original byte stream
        original: PathBuf,
        /// Encoded file, for the compression ratio
        #[arg(short, long)]
        encoded: Option<PathBuf>,
        /// Decoded file, for the fidelity coefficient
        #[arg(short, long)]
        decoded: Option<PathBuf>,
    },

    /// Serialize, encode, decode and measure every file of a directory
    Batch {
        /// Input directory
        #[arg(short, long)]
        input: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
        /// Worker threads
        #[arg(short, long, env = "PIXRLE_JOBS")]
        jobs: Option<usize>,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serialize { image, output } => {
            let bytes = serialize_path(&image)
                .with_context(|| format!("cannot serialize {}", image.display()))?;
            fs::write(&output, &bytes)
                .with_context(|| format!("cannot write {}", output.display()))?;
            println!("{} bytes written to {}", bytes.len(), output.display());
        }
        Commands::Restore {
            stream,
            output,
            width,
            height,
        } => {
            let bytes =
                fs::read(&stream).with_context(|| format!("cannot read {}", stream.display()))?;
            let image = deserialize(bytes, width, height)?;
            image
                .save(&output)
                .with_context(|| format!("cannot write {}", output.display()))?;
            println!("{}x{} image written to {}", width, height, output.display());
        }
        Commands::Encode { input, output } => {
            let size = fs::metadata(&input)
                .with_context(|| format!("cannot read {}", input.display()))?
                .len();
            let encoded = pipeline::encode_file(&input, &output)
                .with_context(|| format!("cannot encode {}", input.display()))?;
            println!("{} -> {} bytes", size, encoded);
            if let Ok(ratio) = compression_ratio(size, encoded) {
                println!("Compression ratio: {:.6}", ratio);
            }
        }
        Commands::Decode { input, output } => {
            let decoded = pipeline::decode_file(&input, &output)
                .with_context(|| format!("cannot decode {}", input.display()))?;
            println!("{} bytes written to {}", decoded, output.display());
        }
        Commands::Inspect { input, limit } => {
            let bytes =
                fs::read(&input).with_context(|| format!("cannot read {}", input.display()))?;
            let runs = parse_runs(&bytes)?;
            println!("value length");
            for run in runs.iter().take(limit.unwrap_or(usize::MAX)) {
                println!("0x{:02x} {}", run.value, run.length);
            }
            let total: u64 = runs.iter().map(|run| run.length as u64).sum();
            println!("{} runs, {} bytes", runs.len(), total);
        }
        Commands::Stats {
            original,
            encoded,
            decoded,
        } => {
            let bytes = fs::read(&original)
                .with_context(|| format!("cannot read {}", original.display()))?;
            let runs = RunStats::of(&bytes);
            println!("Size: {} bytes", bytes.len());
            println!("Entropy: {:.6}", entropy(&bytes)?);
            println!("Repeating sequences: {}", runs.repeats);
            println!("Mean repeating length: {:.6}", runs.mean_repeat_length());
            println!("Repeating ratio: {:.6}", runs.repeating_ratio());
            if let Some(encoded) = encoded {
                let size = fs::metadata(&encoded)
                    .with_context(|| format!("cannot read {}", encoded.display()))?
                    .len();
                println!("Compression ratio: {:.6}", compression_ratio(bytes.len() as u64, size)?);
            }
            if let Some(decoded) = decoded {
                let other = fs::read(&decoded)
                    .with_context(|| format!("cannot read {}", decoded.display()))?;
                println!("Fidelity: {:.6}", fidelity(&bytes, &other));
            }
        }
        Commands::Batch {
            input,
            output,
            jobs,
        } => {
            let mut config = PipelineConfig::new(input, output);
            config.jobs = jobs;
            let outcome = pipeline::run(&config).context("batch run failed")?;
            println!(
                "{} files analyzed, report written to {}",
                outcome.report.rows.len(),
                config.report_path().display()
            );
            for failure in &outcome.failures {
                eprintln!("{}: {}", failure.path.display(), failure.error);
            }
            if !outcome.is_clean() {
                bail!("{} files failed", outcome.failures.len());
            }
        }
    }

    Ok(())
}
