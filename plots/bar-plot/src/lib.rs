use std::path::{Path, PathBuf};

use common::{
    aggregate::{BAR_HEIGHT, CategoryMatrix, GROUP_SPACING, SUBCATEGORIES, SUBCATEGORY_COUNT},
    config::PlotStyle,
    plot::Plot,
    report::DEFAULT_METRIC,
};
use eyre::{ContextCompat, Result};
use plot_common::{Figure, font, render_figure, rgb, text_width};
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_RESULTS_DIR: &str = "./results";

/// Grouped horizontal bars of one timing per (distribution, sort) json record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarPlot {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_metric")]
    pub metric: String,
    pub output: PathBuf,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RESULTS_DIR)
}

fn default_metric() -> String {
    DEFAULT_METRIC.to_owned()
}

impl Default for BarPlot {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            metric: default_metric(),
            output: PathBuf::from("diffdistrib.svg"),
        }
    }
}

#[typetag::serde]
impl Plot for BarPlot {
    fn name(&self) -> &'static str {
        "BarPlot"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn plot(&self, style: &PlotStyle) -> Result<()> {
        let matrix = CategoryMatrix::from_results_dir(&self.results_dir, &self.metric)?;
        if matrix.is_empty() {
            warn!("No results found in {}", self.results_dir.display());
        }
        for (category, values) in matrix.iter() {
            debug!("{category}");
            for (sort, value) in SUBCATEGORIES.iter().zip(values) {
                debug!("{sort} {value}");
            }
        }

        render_figure(
            &BarFigure { matrix: &matrix },
            &self.output,
            style.figure_px(style.bar_figure),
            style,
        )
    }
}

struct BarFigure<'a> {
    matrix: &'a CategoryMatrix,
}

impl Figure for BarFigure<'_> {
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &PlotStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let colors = style
            .bar_colors
            .get(..SUBCATEGORY_COUNT)
            .context("Not enough bar colors")?;
        let groups = self.matrix.len().max(1) as f64;
        let max = self.matrix.max_value();
        let x_max = if max > 0.0 { max * 1.05 } else { 1.0 };
        let pad = style.px(style.font_size / 2.0);
        let label_width = self
            .matrix
            .categories()
            .map(|c| text_width(style, style.category_name(c)))
            .max()
            .unwrap_or(0);

        let mut chart = ChartBuilder::on(root)
            .margin(style.px(6.0))
            .x_label_area_size(style.px(style.font_size * 3.0))
            .y_label_area_size(label_width + 2 * pad)
            .build_cartesian_2d(0f64..x_max, 0f64..groups * GROUP_SPACING)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .y_label_formatter(&|_| String::new())
            .x_desc(style.bar_x_label.as_str())
            .label_style(font(style))
            .axis_desc_style(font(style))
            .draw()?;

        let half = BAR_HEIGHT / 2.0;
        chart.draw_series(self.matrix.bar_positions().into_iter().map(|bar| {
            Rectangle::new(
                [(0.0, bar.y - half), (bar.value, bar.y + half)],
                rgb(colors[bar.index]).filled(),
            )
        }))?;

        let tick_style = TextStyle::from(font(style)).pos(Pos::new(HPos::Right, VPos::Center));
        for (y, category) in self.matrix.ticks() {
            let (x, y) = chart.backend_coord(&(0.0, y));
            root.draw(&Text::new(
                style.category_name(category).to_owned(),
                (x - pad as i32, y),
                tick_style.clone(),
            ))?;
        }

        let swatch = pad as i32;
        for (label, &color) in style.subcategory_labels.iter().zip(colors) {
            let color = rgb(color);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(0.0, 0.0), (0.0, 0.0)],
                    color.filled(),
                )))?
                .label(label.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - swatch), (x + 2 * swatch, y + swatch)], color.filled())
                });
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .label_font(font(style))
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()?;
        Ok(())
    }
}
