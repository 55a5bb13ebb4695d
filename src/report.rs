//! Whitespace-delimited results table, one line per analyzed file.

use crate::metrics::{MetricsRecord, RunStats};
use crate::{Error, Result};
use std::fmt;
use std::io;

pub const HEADER: &str =
    "filename entropy_ratio decoding_ratio compression_ratio start_size[kb] encoded_size[kb]";

const COLUMNS: usize = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub filename: String,
    pub record: MetricsRecord,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

fn kib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

impl ReportRow {
    pub fn new(filename: &str, record: MetricsRecord) -> Self {
        let filename = filename
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        ReportRow { filename, record }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.record;
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6} {:.6}",
            self.filename,
            r.entropy,
            r.fidelity,
            r.compression_ratio,
            kib(r.original_size),
            kib(r.encoded_size)
        )
    }
}

impl Report {
    pub fn push(&mut self, filename: &str, record: MetricsRecord) {
        self.rows.push(ReportRow::new(filename, record));
    }

    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{}", self)?;
        writer.flush()
    }

    /// Reads a table back.
    ///
    /// Sizes come back from their KiB rendering, rounded to whole bytes; run
    /// statistics are not part of the table and are left empty.
    pub fn parse(text: &str) -> Result<Report> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        match lines.next() {
            Some((_, header)) if header.split_whitespace().eq(HEADER.split_whitespace()) => {}
            Some((i, _)) => return Err(malformed(i, "unexpected header".to_string())),
            None => return Ok(Report::default()),
        }
        let rows = lines
            .map(|(i, line)| parse_row(i, line))
            .collect::<Result<Vec<_>>>()?;
        Ok(Report { rows })
    }
}

fn malformed(index: usize, reason: String) -> Error {
    Error::Report {
        line: index + 1,
        reason,
    }
}

fn parse_row(index: usize, line: &str) -> Result<ReportRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != COLUMNS {
        return Err(malformed(
            index,
            format!("expected {} columns, found {}", COLUMNS, fields.len()),
        ));
    }
    let mut numbers = [0f64; COLUMNS - 1];
    for (slot, field) in numbers.iter_mut().zip(&fields[1..]) {
        *slot = field
            .parse()
            .map_err(|e| malformed(index, format!("{field:?}: {e}")))?;
    }
    let [entropy, fidelity, compression_ratio, start_kb, encoded_kb] = numbers;
    Ok(ReportRow {
        filename: fields[0].to_string(),
        record: MetricsRecord {
            entropy,
            fidelity,
            compression_ratio,
            original_size: (start_kb * 1024.0).round() as u64,
            encoded_size: (encoded_kb * 1024.0).round() as u64,
            runs: RunStats::default(),
        },
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(HEADER)?;
        for row in &self.rows {
            write!(f, "\n{}", row)?;
        }
        Ok(())
    }
}
