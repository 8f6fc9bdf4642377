//! Colormaps and value normalization.
//!
//! Named maps reproduce the matplotlib `hot` and `summer` ramps as linear
//! RGB segments between color stops.

use serde::{Deserialize, Serialize};
use window_common::{DatasetKind, Raster2d, WindowError, WindowResult};

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self::rgb(r, g, b))
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors.
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// A color anchored at a normalized position in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f32,
    pub color: Color,
}

impl ColorStop {
    pub const fn new(position: f32, color: Color) -> Self {
        Self { position, color }
    }
}

const HOT: [ColorStop; 4] = [
    ColorStop::new(0.0, Color::rgb(11, 0, 0)),
    ColorStop::new(0.365_079, Color::rgb(255, 0, 0)),
    ColorStop::new(0.746_032, Color::rgb(255, 255, 0)),
    ColorStop::new(1.0, Color::rgb(255, 255, 255)),
];

const SUMMER: [ColorStop; 2] = [
    ColorStop::new(0.0, Color::rgb(0, 128, 102)),
    ColorStop::new(1.0, Color::rgb(255, 255, 102)),
];

/// A piecewise-linear colormap over `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colormap {
    name: String,
    stops: Vec<ColorStop>,
}

impl Colormap {
    /// Black through red and yellow to white.
    pub fn hot() -> Self {
        Self {
            name: "hot".to_string(),
            stops: HOT.to_vec(),
        }
    }

    /// Green to yellow.
    pub fn summer() -> Self {
        Self {
            name: "summer".to_string(),
            stops: SUMMER.to_vec(),
        }
    }

    /// Look up a built-in colormap by name.
    pub fn named(name: &str) -> WindowResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "hot" => Ok(Self::hot()),
            "summer" => Ok(Self::summer()),
            other => Err(WindowError::RenderFailure(format!(
                "unknown colormap '{}'",
                other
            ))),
        }
    }

    /// Colormap from explicit stops.
    ///
    /// Needs at least two stops, sorted by position, starting at 0 and ending at 1.
    pub fn custom(name: impl Into<String>, stops: Vec<ColorStop>) -> WindowResult<Self> {
        let name = name.into();
        let invalid = |reason: &str| {
            WindowError::RenderFailure(format!("colormap '{}': {}", name, reason))
        };

        if stops.len() < 2 {
            return Err(invalid("needs at least two stops"));
        }
        if stops.windows(2).any(|w| w[1].position < w[0].position) {
            return Err(invalid("stops must be sorted by position"));
        }
        let first = stops[0].position;
        let last = stops[stops.len() - 1].position;
        if first != 0.0 || last != 1.0 {
            return Err(invalid("stops must span [0, 1]"));
        }

        Ok(Self { name, stops })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at normalized position `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        for pair in self.stops.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if t <= hi.position {
                let span = hi.position - lo.position;
                if span <= 0.0 {
                    return hi.color;
                }
                return lo.color.lerp(&hi.color, (t - lo.position) / span);
            }
        }

        self.stops[self.stops.len() - 1].color
    }
}

/// Inclusive data range mapped onto a colormap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The range shown for a dataset kind.
    ///
    /// `Count` spans `[0, days]`; `Continuous` spans the non-missing data and
    /// is `None` for an all-missing raster.
    pub fn for_kind(kind: DatasetKind, days: usize, raster: &Raster2d) -> Option<Self> {
        match kind {
            DatasetKind::Count => Some(Self::new(0.0, days as f32)),
            DatasetKind::Continuous => raster
                .value_range()
                .map(|(min, max)| Self::new(min, max)),
        }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Position of `value` in the range; a degenerate range maps everything to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            0.0
        } else {
            ((value - self.min) / span).clamp(0.0, 1.0)
        }
    }
}

/// Colormap plus the range it is stretched over.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub colormap: Colormap,
    pub range: ValueRange,
}

impl ColorScale {
    pub fn new(colormap: Colormap, range: ValueRange) -> Self {
        Self { colormap, range }
    }

    /// Color of a data value; `None` for missing.
    pub fn color_for(&self, value: f32) -> Option<Color> {
        if value.is_nan() {
            None
        } else {
            Some(self.colormap.sample(self.range.normalize(value)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let c = Color::from_hex("#ff8000").unwrap();
        assert_eq!(c, Color::rgb(255, 128, 0));
        assert_eq!(c.to_hex(), "#ff8000");
        assert!(Color::from_hex("fff").is_none());
    }

    #[test]
    fn test_hot_endpoints() {
        let hot = Colormap::hot();
        assert_eq!(hot.sample(0.0), Color::rgb(11, 0, 0));
        assert_eq!(hot.sample(1.0), Color::rgb(255, 255, 255));
        assert_eq!(hot.sample(2.0), Color::rgb(255, 255, 255));
    }

    #[test]
    fn test_degenerate_range_normalizes_to_zero() {
        let range = ValueRange::new(5.0, 5.0);
        assert_eq!(range.normalize(5.0), 0.0);
    }
}
