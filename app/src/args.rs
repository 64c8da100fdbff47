use std::path::PathBuf;

use bar_plot::{BarPlot, DEFAULT_RESULTS_DIR};
use clap::Args;
use common::{aggregate::AxisRange, report::DEFAULT_METRIC};
use eyre::{Result, bail};
use line_plot::{LineInput, LinePlot};

#[derive(Args, Debug)]
pub struct LinesArgs {
    /// First input csv
    #[arg(short = '1', long)]
    file1: PathBuf,
    /// Second input csv
    #[arg(short = '2', long)]
    file2: PathBuf,
    /// Third input csv
    #[arg(short = '3', long)]
    file3: Option<PathBuf>,
    /// Fourth input csv
    #[arg(short = '4', long)]
    file4: Option<PathBuf>,
    /// First input label
    #[arg(long)]
    lab1: String,
    /// Second input label
    #[arg(long, default_value = "")]
    lab2: String,
    /// Third input label, the third report is not drawn without one
    #[arg(long)]
    lab3: Option<String>,
    /// Fourth input label, the fourth report is not drawn without one
    #[arg(long)]
    lab4: Option<String>,
    /// Axis limits: xmin,xmax,ymin,ymax
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    range: Option<Vec<f64>>,
    /// Column plotted for the first report
    #[arg(long, default_value = DEFAULT_METRIC)]
    first_time_column: String,
    /// Column plotted for the other reports
    #[arg(long, default_value = DEFAULT_METRIC)]
    second_time_column: String,
    /// Output image file
    #[arg(short, long, default_value = "naivesort.svg")]
    output: PathBuf,
}

impl LinesArgs {
    pub fn into_plot(self) -> Result<LinePlot> {
        let range = self
            .range
            .as_deref()
            .map(AxisRange::try_from)
            .transpose()?;

        let files = [Some(self.file1), Some(self.file2), self.file3, self.file4];
        let labels = [Some(self.lab1), Some(self.lab2), self.lab3, self.lab4];
        let mut inputs = Vec::new();
        for (i, (file, label)) in files.into_iter().zip(labels).enumerate() {
            let metric = if i == 0 {
                &self.first_time_column
            } else {
                &self.second_time_column
            };
            match (file, label) {
                (Some(file), label) => inputs.push(LineInput::new(file, label, metric)),
                (None, Some(label)) => bail!("Label {label:?} given without --file{}", i + 1),
                (None, None) => {}
            }
        }

        Ok(LinePlot {
            inputs,
            output: self.output,
            range,
        })
    }
}

#[derive(Args, Debug)]
pub struct BarsArgs {
    /// Directory of <prefix>_<distribution>_<sort>.json records
    #[arg(long, default_value = DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,
    /// Field of the first benchmark in each record
    #[arg(short, long, default_value = DEFAULT_METRIC)]
    metric: String,
    /// Output image file
    #[arg(short, long, default_value = "diffdistrib.svg")]
    output: PathBuf,
}

impl BarsArgs {
    pub fn into_plot(self) -> BarPlot {
        BarPlot {
            results_dir: self.results_dir,
            metric: self.metric,
            output: self.output,
        }
    }
}
