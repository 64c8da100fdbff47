use std::path::{Path, PathBuf};

use common::{
    aggregate::{AxisRange, Series, SeriesInput, line_series},
    config::{MAX_SERIES, Marker, PlotStyle},
    plot::Plot,
    report::{DEFAULT_METRIC, parse_report},
};
use eyre::{ContextCompat, Result, bail};
use plot_common::{Figure, font, render_figure, rgb};
use plotters::{coord::Shift, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Up to four csv reports plotted as one line each, time against input size
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LinePlot {
    pub inputs: Vec<LineInput>,
    pub output: PathBuf,
    /// Fixed axes, otherwise the axes cover the data
    #[serde(default)]
    pub range: Option<AxisRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineInput {
    pub file: PathBuf,
    /// Reports without a label are still parsed, but not drawn
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_metric")]
    pub metric: String,
}

fn default_metric() -> String {
    DEFAULT_METRIC.to_owned()
}

impl LineInput {
    pub fn new(file: impl Into<PathBuf>, label: Option<String>, metric: &str) -> Self {
        Self {
            file: file.into(),
            label,
            metric: metric.to_owned(),
        }
    }
}

impl LinePlot {
    /// Parses every report and builds the labelled series
    pub fn load(&self) -> Result<Vec<Series>> {
        if self.inputs.is_empty() || self.inputs.len() > MAX_SERIES {
            bail!(
                "Line plots take 1 to {MAX_SERIES} reports, got {}",
                self.inputs.len()
            )
        }

        let tables = self
            .inputs
            .iter()
            .map(|input| parse_report(&input.file))
            .collect::<Result<Vec<_>, _>>()?;
        let series_inputs = self
            .inputs
            .iter()
            .zip(&tables)
            .map(|(input, table)| SeriesInput {
                table,
                label: input.label.as_deref(),
                metric: &input.metric,
            })
            .collect::<Vec<_>>();

        let series = line_series(&series_inputs)?;
        for s in series.iter().filter(|s| s.points.is_empty()) {
            warn!("Series {:?} has no points", s.label);
        }
        Ok(series)
    }
}

#[typetag::serde]
impl Plot for LinePlot {
    fn name(&self) -> &'static str {
        "LinePlot"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn plot(&self, style: &PlotStyle) -> Result<()> {
        let series = self.load()?;
        debug!("Got {} series", series.len());

        let range = match self.range.or_else(|| AxisRange::covering(&series)) {
            Some(range) => range,
            None => {
                warn!("No data points for {}", self.output.display());
                AxisRange {
                    x_min: 0.0,
                    x_max: 1.0,
                    y_min: 0.0,
                    y_max: 1.0,
                }
            }
        };

        render_figure(
            &LineFigure {
                series: &series,
                range,
            },
            &self.output,
            style.figure_px(style.line_figure),
            style,
        )
    }
}

struct LineFigure<'a> {
    series: &'a [Series],
    range: AxisRange,
}

impl Figure for LineFigure<'_> {
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &PlotStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let AxisRange {
            x_min,
            x_max,
            y_min,
            y_max,
        } = self.range;
        let mut chart = ChartBuilder::on(root)
            .margin(style.px(6.0))
            .x_label_area_size(style.px(style.font_size * 3.0))
            .y_label_area_size(style.px(style.font_size * 4.5))
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(style.line_x_label.as_str())
            .y_desc(style.line_y_label.as_str())
            .label_style(font(style))
            .axis_desc_style(font(style))
            .draw()?;

        let width = style.px(style.line_width);
        let radius = (style.px(style.marker_size) / 2).max(1) as i32;
        for series in self.series {
            let series_style = style
                .series
                .get(series.slot)
                .with_context(|| format!("No style for line {}", series.slot + 1))?;
            let color = rgb(series_style.color);

            chart
                .draw_series(LineSeries::new(
                    series.points.iter().copied(),
                    color.stroke_width(width),
                ))?
                .label(series.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 4 * radius, y)], color.stroke_width(width))
                });

            let points = series.points.iter().copied();
            match series_style.marker {
                Marker::Circle => {
                    chart.draw_series(points.map(|p| Circle::new(p, radius, color.filled())))?;
                }
                Marker::Square => {
                    chart.draw_series(points.map(|p| {
                        EmptyElement::at(p)
                            + Rectangle::new([(-radius, -radius), (radius, radius)], color.filled())
                    }))?;
                }
                Marker::TriangleUp => {
                    chart.draw_series(points.map(|p| {
                        EmptyElement::at(p)
                            + Polygon::new(
                                vec![(0, -radius), (-radius, radius), (radius, radius)],
                                color.filled(),
                            )
                    }))?;
                }
                Marker::TriangleDown => {
                    chart.draw_series(points.map(|p| {
                        EmptyElement::at(p)
                            + Polygon::new(
                                vec![(0, radius), (-radius, -radius), (radius, -radius)],
                                color.filled(),
                            )
                    }))?;
                }
            }
        }

        if !self.series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font(font(style))
                .background_style(WHITE.mix(0.0))
                .draw()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use common::{config::Config, util::read_yaml_file};

    use super::*;

    const PREAMBLE: &str = "2024-03-02T11:20:01+01:00\nRunning ./sortBmks\nRun on (8 X 2400 MHz CPU s)\nCPU Caches:\n  L1 Data 32 KiB (x4)\n  L1 Instruction 32 KiB (x4)\n  L2 Unified 256 KiB (x4)\n  L3 Unified 8192 KiB (x1)\nLoad Average: 1.21, 1.33, 1.40\n";

    fn write_report(dir: &Path, name: &str, sort: &str, times: &[(u64, f64)]) -> PathBuf {
        let mut data = format!("{PREAMBLE}name,iterations,real_time,cpu_time,time_unit\n");
        for (size, time) in times {
            data.push_str(&format!(
                "\"SortingBmk_allUnique/{sort}/{size}\",100,{},{time},us\n",
                time + 1.0
            ));
        }
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    fn two_reports(dir: &Path) -> (PathBuf, PathBuf) {
        (
            write_report(
                dir,
                "stable.csv",
                "StdStableSort",
                &[(10000, 510.0), (60000, 3100.0)],
            ),
            write_report(
                dir,
                "radix.csv",
                "NaiveRadixSort",
                &[(10000, 120.0), (60000, 700.0)],
            ),
        )
    }

    #[test]
    fn loads_labelled_series() {
        let dir = tempfile::tempdir().unwrap();
        let (stable, radix) = two_reports(dir.path());
        let plot = LinePlot {
            inputs: vec![
                LineInput::new(&stable, Some("std::stable_sort".to_owned()), "cpu_time"),
                LineInput::new(&radix, Some("naive radix".to_owned()), "real_time"),
                LineInput::new(&radix, None, "cpu_time"),
                LineInput::new(&stable, None, "cpu_time"),
            ],
            output: dir.path().join("naivesort.svg"),
            range: None,
        };

        let series = plot.load().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].points, vec![(10.0, 510.0), (60.0, 3100.0)]);
        assert_eq!(series[1].label, "naive radix");
        assert_eq!(series[1].points, vec![(10.0, 121.0), (60.0, 701.0)]);
        assert_eq!(plot.load().unwrap(), series);
    }

    #[test]
    fn renders_svg_with_legend() {
        let dir = tempfile::tempdir().unwrap();
        let (stable, radix) = two_reports(dir.path());
        let plot = LinePlot {
            inputs: vec![
                LineInput::new(&stable, Some("std::stable_sort".to_owned()), "cpu_time"),
                LineInput::new(&radix, Some("naive radix".to_owned()), "cpu_time"),
            ],
            output: dir.path().join("out/naivesort.svg"),
            range: Some(AxisRange {
                x_min: 0.0,
                x_max: 100.0,
                y_min: 0.0,
                y_max: 4000.0,
            }),
        };
        let style = PlotStyle {
            dpi: 72,
            ..Default::default()
        };

        plot.plot(&style).unwrap();
        let svg = fs::read_to_string(dir.path().join("out/naivesort.svg")).unwrap();
        assert!(svg.contains("std::stable_sort"));
        assert!(svg.contains("naive radix"));
        assert!(svg.contains("#N, k"));
    }

    #[test]
    fn malformed_report_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.txt");
        fs::write(&path, "BM_Sort/4096   10 us   10 us   1000\n").unwrap();
        let plot = LinePlot {
            inputs: vec![LineInput::new(&path, Some("a".to_owned()), "cpu_time")],
            output: dir.path().join("out.svg"),
            range: None,
        };
        let err = plot.plot(&PlotStyle::default()).unwrap_err();
        assert!(err.to_string().contains("--benchmark_format=csv"));
        assert!(!dir.path().join("out.svg").exists());
    }

    #[test]
    fn input_count_is_checked() {
        let plot = LinePlot::default();
        assert!(plot.load().is_err());

        let plot = LinePlot {
            inputs: vec![LineInput::new("a.csv", None, "cpu_time"); 5],
            ..Default::default()
        };
        assert!(plot.load().unwrap_err().to_string().contains("got 5"));
    }

    #[test]
    fn missing_report_fails() {
        let dir = tempfile::tempdir().unwrap();
        let plot = LinePlot {
            inputs: vec![LineInput::new(
                dir.path().join("missing.csv"),
                Some("a".to_owned()),
                "cpu_time",
            )],
            output: dir.path().join("out.svg"),
            range: None,
        };
        assert!(plot.load().is_err());
    }

    #[test]
    fn loads_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.yaml");
        fs::write(
            &path,
            "name: allunique\nplots:\n  - type: LinePlot\n    output: plots/naivesort.svg\n    inputs:\n      - file: stable.csv\n        label: std::stable_sort\n      - file: radix.csv\n    range:\n      x_min: 0\n      x_max: 400\n      y_min: 0\n      y_max: 30000\n",
        )
        .unwrap();

        let config: Config = read_yaml_file(&path).unwrap();
        assert_eq!(config.name, "allunique");
        assert!(config.style.is_none());
        assert_eq!(config.plots.len(), 1);
        assert_eq!(config.plots[0].name(), "LinePlot");
        assert_eq!(config.plots[0].output(), Path::new("plots/naivesort.svg"));
    }

    #[test]
    fn config_with_empty_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.yaml");
        fs::write(
            &path,
            "name: allunique\nplots:\n  - type: LinePlot\n    output: naivesort.svg\n    inputs:\n      - file: stable.csv\n        label: a\n    range:\n      x_min: 5\n      x_max: 5\n      y_min: 10\n      y_max: 0\n",
        )
        .unwrap();

        let err = read_yaml_file::<Config>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Empty axis range"));
    }
}
