use std::path::Path;

use common::{
    config::{HexColor, PlotStyle},
    plot::OutputFormat,
    util::ensure_parent_dir,
};
use eyre::Result;
use plotters::{coord::Shift, prelude::*};
use tracing::debug;

/// A chart that can draw itself on any plotters backend
pub trait Figure {
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &PlotStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

/// Renders `figure` into `output`, the image format follows the file extension
pub fn render_figure<F: Figure>(
    figure: &F,
    output: &Path,
    size: (u32, u32),
    style: &PlotStyle,
) -> Result<()> {
    ensure_parent_dir(output)?;
    debug!("Drawing {}x{} image to {}", size.0, size.1, output.display());
    match OutputFormat::from_path(output)? {
        OutputFormat::Svg => {
            draw_root(figure, SVGBackend::new(output, size).into_drawing_area(), style)
        }
        OutputFormat::Png => render_bitmap(figure, output, size, style),
    }
}

#[cfg(feature = "png")]
fn render_bitmap<F: Figure>(
    figure: &F,
    output: &Path,
    size: (u32, u32),
    style: &PlotStyle,
) -> Result<()> {
    draw_root(figure, BitMapBackend::new(output, size).into_drawing_area(), style)
}

#[cfg(not(feature = "png"))]
fn render_bitmap<F: Figure>(
    _figure: &F,
    output: &Path,
    _size: (u32, u32),
    _style: &PlotStyle,
) -> Result<()> {
    eyre::bail!(
        "Cannot write {}: png output needs the `png` feature, use .svg instead",
        output.display()
    )
}

fn draw_root<F, DB>(figure: &F, root: DrawingArea<DB, Shift>, style: &PlotStyle) -> Result<()>
where
    F: Figure,
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    figure.draw(&root, style)?;
    root.present()?;
    Ok(())
}

pub fn rgb(color: HexColor) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Base font of the style, as pixels
pub fn font(style: &PlotStyle) -> (&str, f64) {
    (style.font_family.as_str(), style.font_px())
}

/// Rough width of `text` in the style's font, used to size label areas
pub fn text_width(style: &PlotStyle, text: &str) -> u32 {
    (text.chars().count() as f64 * style.font_px() * 0.6).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame;

    impl Figure for Frame {
        fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &PlotStyle) -> Result<()>
        where
            DB: DrawingBackend,
            DB::ErrorType: 'static,
        {
            let mut chart = ChartBuilder::on(root)
                .x_label_area_size(style.px(20.0))
                .y_label_area_size(style.px(20.0))
                .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;
            chart.configure_mesh().x_desc("frame").draw()?;
            Ok(())
        }
    }

    #[test]
    fn renders_svg() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots/frame.svg");
        let style = PlotStyle {
            dpi: 72,
            ..Default::default()
        };
        render_figure(&Frame, &out, (200, 200), &style).unwrap();
        let svg = std::fs::read_to_string(&out).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("frame"));
    }

    #[cfg(not(feature = "png"))]
    #[test]
    fn png_needs_feature() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frame.png");
        let err = render_figure(&Frame, &out, (200, 200), &PlotStyle::default()).unwrap_err();
        assert!(err.to_string().contains("png"));
        assert!(!out.exists());
    }

    #[test]
    fn colors_and_sizes() {
        assert_eq!(rgb(HexColor::ORANGE), RGBColor(0xEE, 0x7F, 0x2D));
        let style = PlotStyle {
            dpi: 72,
            font_size: 10.0,
            ..Default::default()
        };
        assert_eq!(font(&style), ("sans-serif", 10.0));
        assert_eq!(text_width(&style, "shuffled"), 48);
    }
}
