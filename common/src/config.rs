use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{aggregate::SUBCATEGORY_COUNT, plot::Plot};

/// Line slots a [`PlotStyle`] must provide
pub const MAX_SERIES: usize = 4;

#[derive(Error, Debug, PartialEq)]
pub enum StyleError {
    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),
    #[error("Style needs {expected} {what}, got {got}")]
    TooFew {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Invalid dpi {0}")]
    InvalidDpi(u32),
    #[error("{what} must be positive, got {value}")]
    NotPositive { what: &'static str, value: f64 },
}

/// A plot description file, ie. `plots.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub style: Option<PlotStyle>,
    pub plots: Vec<Box<dyn Plot>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub u8, pub u8, pub u8);

impl HexColor {
    pub const BLACK: Self = Self(0x00, 0x00, 0x00);
    pub const GRAY: Self = Self(0x80, 0x80, 0x80);
    pub const ORANGE: Self = Self(0xEE, 0x7F, 0x2D);
    pub const GREEN: Self = Self(0x03, 0x6D, 0x15);
    pub const BLUE: Self = Self(0x0A, 0x3F, 0xF4);
    pub const RED: Self = Self(0xFF, 0x23, 0x1F);
}

impl FromStr for HexColor {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StyleError::InvalidColor(s.to_owned());
        match s.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::BLACK),
            "gray" | "grey" => return Ok(Self::GRAY),
            _ => {}
        }
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for HexColor {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    TriangleDown,
    TriangleUp,
    Circle,
    Square,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    pub color: HexColor,
    pub marker: Marker,
}

/// Everything about how a chart looks. Built once and handed to each plot.
///
/// Sizes are in points and inches, converted to pixels with [`PlotStyle::dpi`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub font_family: String,
    pub font_size: f64,
    pub dpi: u32,
    /// Figure size in inches for line plots
    pub line_figure: (f64, f64),
    /// Figure size in inches for bar plots
    pub bar_figure: (f64, f64),
    pub line_width: f64,
    pub marker_size: f64,
    /// Color and marker per line slot
    pub series: Vec<SeriesStyle>,
    /// Color per sort slot
    pub bar_colors: Vec<HexColor>,
    /// Legend text per sort slot
    pub subcategory_labels: Vec<String>,
    /// Display names for input distributions, unknown ones are shown as is
    pub category_names: BTreeMap<String, String>,
    pub line_x_label: String,
    pub line_y_label: String,
    pub bar_x_label: String,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_owned(),
            font_size: 17.0,
            dpi: 300,
            line_figure: (6.0, 6.0),
            bar_figure: (6.4, 4.8),
            line_width: 2.0,
            marker_size: 5.0,
            series: vec![
                SeriesStyle {
                    color: HexColor::ORANGE,
                    marker: Marker::TriangleDown,
                },
                SeriesStyle {
                    color: HexColor::GREEN,
                    marker: Marker::TriangleUp,
                },
                SeriesStyle {
                    color: HexColor::GRAY,
                    marker: Marker::Circle,
                },
                SeriesStyle {
                    color: HexColor::BLUE,
                    marker: Marker::Square,
                },
            ],
            bar_colors: vec![
                HexColor::BLUE,
                HexColor::GREEN,
                HexColor::RED,
                HexColor::BLACK,
                HexColor::ORANGE,
            ],
            subcategory_labels: [
                "std::stable_sort",
                "boost::spread_sort",
                "radix_sort_msd",
                "radix_sort_lsd",
                "radix_sort_hybrid",
            ]
            .map(str::to_owned)
            .to_vec(),
            category_names: [("allequal", "all equal"), ("fewunique", "few unique")]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            line_x_label: "#N, k".to_owned(),
            line_y_label: "Time,  us".to_owned(),
            bar_x_label: "Time, ms".to_owned(),
        }
    }
}

impl PlotStyle {
    pub fn validate(&self) -> Result<(), StyleError> {
        let check = |what, expected, got| {
            if got < expected {
                Err(StyleError::TooFew {
                    what,
                    expected,
                    got,
                })
            } else {
                Ok(())
            }
        };
        check("series styles", MAX_SERIES, self.series.len())?;
        check("bar colors", SUBCATEGORY_COUNT, self.bar_colors.len())?;
        check(
            "subcategory labels",
            SUBCATEGORY_COUNT,
            self.subcategory_labels.len(),
        )?;
        if self.dpi == 0 {
            return Err(StyleError::InvalidDpi(self.dpi));
        }
        let sizes = [
            ("font_size", self.font_size),
            ("line_figure width", self.line_figure.0),
            ("line_figure height", self.line_figure.1),
            ("bar_figure width", self.bar_figure.0),
            ("bar_figure height", self.bar_figure.1),
            ("line_width", self.line_width),
            ("marker_size", self.marker_size),
        ];
        for (what, value) in sizes {
            // NaN fails this too
            if !(value > 0.0 && value.is_finite()) {
                return Err(StyleError::NotPositive { what, value });
            }
        }
        Ok(())
    }

    /// Points to pixels, never below 1
    pub fn px(&self, points: f64) -> u32 {
        ((points * self.dpi as f64 / 72.0).round() as u32).max(1)
    }

    /// Inches to pixels
    pub fn figure_px(&self, (width, height): (f64, f64)) -> (u32, u32) {
        let dpi = self.dpi as f64;
        ((width * dpi).round() as u32, (height * dpi).round() as u32)
    }

    pub fn font_px(&self) -> f64 {
        self.px(self.font_size) as f64
    }

    pub fn category_name<'a>(&'a self, category: &'a str) -> &'a str {
        self.category_names
            .get(category)
            .map(String::as_str)
            .unwrap_or(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colors() {
        assert_eq!("#EE7F2D".parse(), Ok(HexColor::ORANGE));
        assert_eq!("#036d15".parse(), Ok(HexColor::GREEN));
        assert_eq!("gray".parse(), Ok(HexColor::GRAY));
        assert_eq!("Black".parse(), Ok(HexColor::BLACK));
        assert_eq!(HexColor::ORANGE.to_string(), "#EE7F2D");
    }

    #[test]
    fn rejects_bad_colors() {
        for bad in ["EE7F2D", "#EE7F2", "#GG7F2D", "#ÉE7F2", "red"] {
            assert_eq!(
                bad.parse::<HexColor>(),
                Err(StyleError::InvalidColor(bad.to_owned()))
            );
        }
    }

    #[test]
    fn partial_style_keeps_defaults() {
        let style: PlotStyle = serde_yml::from_str(
            "font_size: 12\nbar_colors: ['#000000', '#111111', '#222222', '#333333', '#444444']\ncategory_names:\n  almostsorted: almost sorted\n",
        )
        .unwrap();
        assert_eq!(style.font_size, 12.0);
        assert_eq!(style.bar_colors[1], HexColor(0x11, 0x11, 0x11));
        assert_eq!(style.dpi, 300);
        assert_eq!(style.series, PlotStyle::default().series);
        assert_eq!(style.category_name("almostsorted"), "almost sorted");
        assert_eq!(style.category_name("allequal"), "allequal");
        assert!(style.validate().is_ok());
    }

    #[test]
    fn style_with_bad_color_fails_to_load() {
        let res: Result<PlotStyle, _> = serde_yml::from_str("bar_colors: ['#00']\n");
        assert!(res.is_err());
    }

    #[test]
    fn validate_counts_slots() {
        let style = PlotStyle {
            bar_colors: vec![HexColor::BLACK; 3],
            ..Default::default()
        };
        assert_eq!(
            style.validate(),
            Err(StyleError::TooFew {
                what: "bar colors",
                expected: SUBCATEGORY_COUNT,
                got: 3
            })
        );
        assert!(PlotStyle::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_sizes() {
        let style = PlotStyle {
            line_figure: (0.0, 0.0),
            ..Default::default()
        };
        assert_eq!(
            style.validate(),
            Err(StyleError::NotPositive {
                what: "line_figure width",
                value: 0.0
            })
        );

        let style = PlotStyle {
            bar_figure: (6.4, -1.0),
            ..Default::default()
        };
        assert!(matches!(
            style.validate(),
            Err(StyleError::NotPositive {
                what: "bar_figure height",
                ..
            })
        ));

        let style: PlotStyle = serde_yml::from_str("font_size: 0\n").unwrap();
        assert!(matches!(
            style.validate(),
            Err(StyleError::NotPositive {
                what: "font_size",
                ..
            })
        ));
    }

    #[test]
    fn style_yaml_round_trip() {
        let style = PlotStyle {
            bar_colors: vec![
                HexColor(0x12, 0xAB, 0xEF),
                HexColor::RED,
                HexColor::GRAY,
                HexColor::BLACK,
                HexColor::ORANGE,
            ],
            line_figure: (5.5, 4.0),
            ..Default::default()
        };
        let yaml = serde_yml::to_string(&style).unwrap();
        assert!(yaml.contains("#12ABEF"));
        let parsed: PlotStyle = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed, style);
    }

    #[test]
    fn unit_conversions() {
        let style = PlotStyle::default();
        assert_eq!(style.px(72.0), 300);
        assert_eq!(style.px(0.0), 1);
        assert_eq!(style.figure_px(style.line_figure), (1800, 1800));
        assert_eq!(style.figure_px(style.bar_figure), (1920, 1440));
        assert_eq!(style.category_name("fewunique"), "few unique");
        assert_eq!(style.category_name("shuffled"), "shuffled");
    }
}
