use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Context lines google benchmark prints ahead of the csv header
pub const REPORT_PREAMBLE_LINES: usize = 9;
pub const DEFAULT_METRIC: &str = "cpu_time";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(
        "Could not parse the benchmark data in {}: {reason}. Did you forget \"--benchmark_format=csv\"?",
        .path.display()
    )]
    Malformed { path: PathBuf, reason: String },
    #[error("Could not read report {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum MissingMetricError {
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No benchmarks recorded in {}", .path.display())]
    NoBenchmarks { path: PathBuf },
    #[error("Field {field} missing from the first benchmark in {}", .path.display())]
    MissingField { path: PathBuf, field: String },
}

/// One row of a benchmark report
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkObservation {
    pub name: String,
    /// Trailing `/` segment of the name, ie. `4096` for `BM_Sort/shuffled/4096`
    pub input_size: u64,
    /// Every numeric cell of the row, keyed by column name
    pub metrics: HashMap<String, f64>,
}

impl BenchmarkObservation {
    pub fn metric(&self, column: &str) -> Option<f64> {
        self.metrics.get(column).copied()
    }
}

/// All observations read from a single report, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub observations: Vec<BenchmarkObservation>,
}

impl ReportTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Reads a google benchmark csv report (`--benchmark_format=csv`)
pub fn parse_report(path: impl AsRef<Path>) -> Result<ReportTable, ReportError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_report_str(path, &data)
}

/// Same as [`parse_report`], for a report already in memory. `path` is only used in errors.
pub fn parse_report_str(path: &Path, data: &str) -> Result<ReportTable, ReportError> {
    let malformed = |reason: String| ReportError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let body = skip_lines(data, REPORT_PREAMBLE_LINES).ok_or_else(|| {
        malformed(format!(
            "expected {REPORT_PREAMBLE_LINES} preamble lines followed by a csv table"
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(e.to_string()))?
        .iter()
        .map(str::to_owned)
        .collect();
    let name_idx = columns
        .iter()
        .position(|c| c == "name")
        .ok_or_else(|| malformed("missing `name` column".to_owned()))?;

    let mut observations = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| malformed(e.to_string()))?;
        let name = record.get(name_idx).unwrap_or_default();
        let input_size = input_size(name).ok_or_else(|| {
            malformed(format!(
                "row {}: no input size at the end of name {name:?}",
                row + 1
            ))
        })?;

        let metrics = columns
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != name_idx)
            .filter_map(|(_, (column, value))| {
                value.parse::<f64>().ok().map(|v| (column.clone(), v))
            })
            .collect();

        observations.push(BenchmarkObservation {
            name: name.to_owned(),
            input_size,
            metrics,
        });
    }

    debug!(
        "Parsed {} observations from {}",
        observations.len(),
        path.display()
    );
    Ok(ReportTable {
        path: path.to_path_buf(),
        columns,
        observations,
    })
}

/// Parses the trailing `/` delimited segment of a benchmark name
pub fn input_size(name: &str) -> Option<u64> {
    name.rsplit('/').next()?.trim().parse().ok()
}

fn skip_lines(data: &str, n: usize) -> Option<&str> {
    if n == 0 {
        return Some(data);
    }
    data.match_indices('\n')
        .nth(n - 1)
        .map(|(i, _)| &data[i + 1..])
}

/// Google benchmark `--benchmark_format=json` output
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkRecord {
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkRun {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

/// `benchmarks[0].cpu_time` of a json record
pub fn parse_json_metric(path: impl AsRef<Path>) -> Result<f64, MissingMetricError> {
    parse_json_metric_field(path, DEFAULT_METRIC)
}

/// `benchmarks[0].<field>` of a json record
pub fn parse_json_metric_field(
    path: impl AsRef<Path>,
    field: &str,
) -> Result<f64, MissingMetricError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| MissingMetricError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record: BenchmarkRecord =
        serde_json::from_str(&data).map_err(|source| MissingMetricError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let first = record
        .benchmarks
        .first()
        .ok_or_else(|| MissingMetricError::NoBenchmarks {
            path: path.to_path_buf(),
        })?;
    first
        .fields
        .get(field)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| MissingMetricError::MissingField {
            path: path.to_path_buf(),
            field: field.to_owned(),
        })
}
