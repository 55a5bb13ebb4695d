//! File-level codec operations and the batch run over a directory.
//!
//! Each input file is an independent unit of work:
//!
//! ```text
//! image ──serialize──▶ raw/<stem>.raw ──encode──▶ encoded/<stem>_encoded.rle
//!                                                          │
//!     results.txt ◀──metrics── decoded/<stem>_decoded.raw ◀┘ decode
//! ```
//!
//! Files that are not images are taken as already serialized streams and
//! read in place. Workers share nothing; a failing file is recorded and the
//! batch goes on.

use crate::metrics::MetricsRecord;
use crate::report::Report;
use crate::serialize::{is_image, serialize_path};
use crate::{DeRle, Error, Result, Rle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const RAW_DIR: &str = "raw";
pub const ENCODED_DIR: &str = "encoded";
pub const DECODED_DIR: &str = "decoded";
pub const REPORT_FILE: &str = "results.txt";

/// Encodes the file at `src` into `dst`, returning the encoded size.
pub fn encode_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<u64> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let mut reader = BufReader::new(fs::File::open(src)?);
    let mut rle = Rle::new(BufWriter::new(fs::File::create(dst)?));
    io::copy(&mut reader, &mut rle)?;
    let (writer, written) = rle.finalize()?;
    writer.into_inner().map_err(|e| e.into_error())?;
    debug!("encoded {} -> {} ({} bytes)", src.display(), dst.display(), written);
    Ok(written)
}

/// Decodes the file at `src` into `dst`, returning the decoded size.
///
/// The whole stream is decoded in memory first: `dst` is only written when
/// `src` decodes cleanly.
pub fn decode_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<u64> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let mut reader = BufReader::new(fs::File::open(src)?);
    let mut derle = DeRle::new(Vec::<u8>::new());
    io::copy(&mut reader, &mut derle)?;
    let decoded = derle.finalize()?;
    fs::write(dst, &decoded)?;
    debug!("decoded {} -> {} ({} bytes)", src.display(), dst.display(), decoded.len());
    Ok(decoded.len() as u64)
}

/// Measures an original stream against its encoded and decoded files.
pub fn measure_files(
    original: impl AsRef<Path>,
    encoded: impl AsRef<Path>,
    decoded: impl AsRef<Path>,
) -> Result<MetricsRecord> {
    let original = fs::read(original)?;
    let encoded_size = fs::metadata(encoded)?.len();
    let decoded = fs::read(decoded)?;
    MetricsRecord::measure(&original, encoded_size, &decoded)
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// worker threads, rayon's default when `None`
    pub jobs: Option<usize>,
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            jobs: None,
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    fn paths(&self, source: &Path) -> FilePaths {
        let stem = source
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let raw = if is_image(source) {
            self.output_dir.join(RAW_DIR).join(format!("{stem}.raw"))
        } else {
            source.to_path_buf()
        };
        FilePaths {
            source: source.to_path_buf(),
            raw,
            encoded: self
                .output_dir
                .join(ENCODED_DIR)
                .join(format!("{stem}_encoded.rle")),
            decoded: self
                .output_dir
                .join(DECODED_DIR)
                .join(format!("{stem}_decoded.raw")),
        }
    }
}

/// Where one input's intermediate files live.
#[derive(Clone, Debug)]
struct FilePaths {
    source: PathBuf,
    raw: PathBuf,
    encoded: PathBuf,
    decoded: PathBuf,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub report: Report,
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn process(paths: &FilePaths) -> Result<MetricsRecord> {
    if paths.raw != paths.source {
        let bytes = serialize_path(&paths.source)?;
        fs::write(&paths.raw, bytes)?;
    }
    encode_file(&paths.raw, &paths.encoded)?;
    decode_file(&paths.encoded, &paths.decoded)?;
    measure_files(&paths.raw, &paths.encoded, &paths.decoded)
}

fn list_inputs(config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    // a previous report in a shared directory is output, not input
    let shared = fs::canonicalize(&config.input_dir)? == fs::canonicalize(&config.output_dir)?;
    let mut inputs = Vec::new();
    for entry in fs::read_dir(&config.input_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() || (shared && entry.file_name() == REPORT_FILE) {
            continue;
        }
        inputs.push(entry.path());
    }
    inputs.sort();
    Ok(inputs)
}

/// Runs every file of the input directory through the codec and writes the report.
///
/// Only directory-level problems (unreadable input directory, output
/// directory or report not writable) fail the whole run.
pub fn run(config: &PipelineConfig) -> Result<BatchOutcome> {
    for dir in [RAW_DIR, ENCODED_DIR, DECODED_DIR] {
        fs::create_dir_all(config.output_dir.join(dir))?;
    }
    let inputs = list_inputs(config)?;
    info!(
        "processing {} files from {}",
        inputs.len(),
        config.input_dir.display()
    );

    let mut failures = Vec::new();
    let mut stems: HashMap<PathBuf, usize> = HashMap::new();
    let jobs: Vec<FilePaths> = inputs.iter().map(|input| config.paths(input)).collect();
    for job in &jobs {
        *stems.entry(job.encoded.clone()).or_default() += 1;
    }
    let (jobs, clashing): (Vec<_>, Vec<_>) = jobs
        .into_iter()
        .partition(|job| stems[&job.encoded] == 1);
    for job in clashing {
        warn!("{}: duplicate stem, skipped", job.source.display());
        failures.push(FileFailure {
            error: Error::DuplicateStem(job.source.clone()),
            path: job.source,
        });
    }

    let work = || -> Vec<(PathBuf, Result<MetricsRecord>)> {
        jobs.par_iter()
            .map(|job| (job.source.clone(), process(job)))
            .collect()
    };
    let results = match config.jobs {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(work),
        None => work(),
    };

    let mut report = Report::default();
    for (path, result) in results {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        match result {
            Ok(record) => {
                debug!("{}: {:?}", name, record);
                report.push(&name, record);
            }
            Err(error) => {
                warn!("{}: {}", path.display(), error);
                failures.push(FileFailure { path, error });
            }
        }
    }
    failures.sort_by(|a, b| a.path.cmp(&b.path));

    let out = BufWriter::new(fs::File::create(config.report_path())?);
    report.write_to(out)?;
    info!(
        "{} files analyzed, {} failed, report at {}",
        report.rows.len(),
        failures.len(),
        config.report_path().display()
    );
    Ok(BatchOutcome { report, failures })
}
