use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use eyre::{Context, Result, bail};
use itertools::{Itertools, MinMaxResult};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    INPUT_SIZE_SCALE,
    report::{ReportTable, parse_json_metric_field},
};

/// Sort implementations with a fixed slot in bar charts, in slot order
pub const SUBCATEGORIES: [&str; 5] = [
    "StdStableSort",
    "BoostSpreadSort",
    "MSDRadixSort",
    "LSDRadixSort",
    "HybridRadixSort",
];
pub const SUBCATEGORY_COUNT: usize = SUBCATEGORIES.len();

pub const BAR_HEIGHT: f64 = 0.5;
pub const GROUP_SPACING: f64 = 3.0;
const AUTO_MARGIN: f64 = 0.05;

/// `<prefix>_<category>_<subcategory>[.<anything>].json`
static RESULT_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^_]*_(?P<category>[^_]+)_(?P<subcategory>[^_.]+)").unwrap()
});

#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("Column {column} not found in {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },
}

pub fn subcategory_index(name: &str) -> Option<usize> {
    SUBCATEGORIES.iter().position(|s| *s == name)
}

#[derive(Debug, Clone, Copy)]
pub struct SeriesInput<'a> {
    pub table: &'a ReportTable,
    /// Series without a label are left out of the plot
    pub label: Option<&'a str>,
    pub metric: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Position of the input this series came from, selects its color and marker
    pub slot: usize,
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Turns each labelled table into `(input_size / 1000, metric)` points.
/// Rows with an empty cell for the metric are skipped.
pub fn line_series(inputs: &[SeriesInput<'_>]) -> Result<Vec<Series>, AggregateError> {
    inputs
        .iter()
        .enumerate()
        .filter_map(|(slot, input)| input.label.map(|label| (slot, label, input)))
        .map(|(slot, label, input)| {
            if !input.table.has_column(input.metric) {
                return Err(AggregateError::MissingColumn {
                    column: input.metric.to_owned(),
                    path: input.table.path.clone(),
                });
            }
            let points = input
                .table
                .observations
                .iter()
                .filter_map(|o| {
                    o.metric(input.metric)
                        .map(|y| (o.input_size as f64 / INPUT_SIZE_SCALE, y))
                })
                .collect();
            Ok(Series {
                slot,
                label: label.to_owned(),
                points,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Unchecked form of [`AxisRange`] as written in config files
#[derive(Deserialize)]
struct RawAxisRange {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl AxisRange {
    /// Fails unless both axes span a non-empty interval
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        // Written so that NaN bounds are rejected too
        if !(x_min < x_max && y_min < y_max) {
            bail!("Empty axis range x: {x_min}..{x_max}, y: {y_min}..{y_max}")
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Bounds of all points with a 5% margin on each side
    pub fn covering(series: &[Series]) -> Option<Self> {
        let points = || {
            series
                .iter()
                .flat_map(|s| s.points.iter())
                .filter(|(x, y)| x.is_finite() && y.is_finite())
        };
        let (x_min, x_max) = padded(points().map(|p| p.0).minmax())?;
        let (y_min, y_max) = padded(points().map(|p| p.1).minmax())?;
        Some(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

impl TryFrom<&[f64]> for AxisRange {
    type Error = eyre::Report;

    /// `[x_min, x_max, y_min, y_max]`
    fn try_from(values: &[f64]) -> Result<Self> {
        let &[x_min, x_max, y_min, y_max] = values else {
            bail!("Axis range needs 4 values, got {}", values.len())
        };
        Self::new(x_min, x_max, y_min, y_max)
    }
}

impl<'de> Deserialize<'de> for AxisRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAxisRange::deserialize(deserializer)?;
        Self::new(raw.x_min, raw.x_max, raw.y_min, raw.y_max).map_err(de::Error::custom)
    }
}

fn padded(bounds: MinMaxResult<f64>) -> Option<(f64, f64)> {
    let (lo, hi) = match bounds {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let pad = if hi > lo {
        (hi - lo) * AUTO_MARGIN
    } else {
        lo.abs().max(1.0) * AUTO_MARGIN
    };
    Some((lo - pad, hi + pad))
}

/// Timing per (category, subcategory). Categories iterate in label order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMatrix {
    rows: BTreeMap<String, [f64; SUBCATEGORY_COUNT]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarPosition {
    pub category: String,
    pub index: usize,
    /// Centre of the bar on the category axis
    pub y: f64,
    pub value: f64,
}

impl CategoryMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false, leaving the matrix untouched, for an unknown subcategory
    pub fn insert(&mut self, category: &str, subcategory: &str, value: f64) -> bool {
        let Some(index) = subcategory_index(subcategory) else {
            return false;
        };
        self.rows
            .entry(category.to_owned())
            .or_insert([0.0; SUBCATEGORY_COUNT])[index] = value;
        true
    }

    pub fn get(&self, category: &str) -> Option<&[f64; SUBCATEGORY_COUNT]> {
        self.rows.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64; SUBCATEGORY_COUNT])> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_value(&self) -> f64 {
        self.rows
            .values()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    /// Scans `dir` for `*_<category>_<subcategory>.json` records and stores
    /// `benchmarks[0].<metric>` of each. Records without the metric count as 0.
    pub fn from_results_dir(dir: impl AsRef<Path>, metric: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let mut matrix = Self::new();
        let mut paths = fs::read_dir(dir)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|e| e.path()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .wrap_err_with(|| format!("Read results dir {}", dir.display()))?;
        // Later records override earlier ones for the same cell
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut filled: BTreeMap<(String, usize), String> = BTreeMap::new();
        for path in paths {
            let Some(file_name) = path.file_name().and_then(|x| x.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".json") {
                continue;
            }
            let Some(caps) = RESULT_FILE.captures(file_name) else {
                debug!("Skipping {file_name}, not a <prefix>_<category>_<sort>.json record");
                continue;
            };
            let (category, subcategory) = (&caps["category"], &caps["subcategory"]);
            let Some(index) = subcategory_index(subcategory) else {
                warn!("Unknown sort {subcategory} in {file_name}, skipping");
                continue;
            };

            let value = match parse_json_metric_field(&path, metric) {
                Ok(value) => value,
                Err(err) => {
                    warn!("Failed to parse '{}': {err}", path.display());
                    0.0
                }
            };
            debug!("{category} {subcategory} {value}");
            if let Some(previous) =
                filled.insert((category.to_owned(), index), file_name.to_owned())
            {
                warn!("{file_name} overrides {previous} for {category} {subcategory}");
            }
            matrix.insert(category, subcategory, value);
        }
        Ok(matrix)
    }

    /// Horizontal bar layout: group `k` is shifted by `k * GROUP_SPACING`,
    /// subcategory 0 is drawn on top of its group.
    pub fn bar_positions(&self) -> Vec<BarPosition> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(group, (category, values))| {
                let shift = group as f64 * GROUP_SPACING;
                values.iter().enumerate().map(move |(index, &value)| BarPosition {
                    category: category.clone(),
                    index,
                    y: (SUBCATEGORY_COUNT - 1 - index) as f64 * BAR_HEIGHT + BAR_HEIGHT + shift,
                    value,
                })
            })
            .collect()
    }

    /// Centre of each category group on the category axis
    pub fn ticks(&self) -> Vec<(f64, &str)> {
        let centre = BAR_HEIGHT + (SUBCATEGORY_COUNT - 1) as f64 * BAR_HEIGHT / 2.0;
        self.categories()
            .enumerate()
            .map(|(group, category)| (centre + group as f64 * GROUP_SPACING, category))
            .collect()
    }
}
