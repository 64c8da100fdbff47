use core::fmt::Debug;
use std::path::Path;

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result, bail};
use tracing::debug;

use crate::config::PlotStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    /// Picks the image format from the output file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|x| x.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("svg") => Ok(Self::Svg),
            Some("png") => Ok(Self::Png),
            Some(other) => bail!("Unsupported image format .{other} for {}", path.display()),
            None => bail!("Output {} has no image extension (.svg or .png)", path.display()),
        }
    }
}

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Name of the plot, for identification
    fn name(&self) -> &'static str;
    /// Image file the plot is rendered to
    fn output(&self) -> &Path;
    /// Loads the benchmark data and renders it
    ///
    /// Arguments:
    /// * `style` - Colors, fonts and sizes shared by every plot of the run
    fn plot(&self, style: &PlotStyle) -> Result<()>;
}
clone_trait_object!(Plot);

pub fn plot(plots: &[Box<dyn Plot>], style: &PlotStyle) -> Result<()> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(());
    }

    for plot in plots {
        debug!("Rendering {} to {}", plot.name(), plot.output().display());
        plot.plot(style)
            .wrap_err_with(|| format!("Render {} to {}", plot.name(), plot.output().display()))?;
    }
    Ok(())
}
