//! Host-owned settings and their translation into shader uniforms.

use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::Error;

pub const SPEED_RANGE: RangeInclusive<f32> = 1.0..=100.0;
pub const DEFAULT_SPEED: f32 = 50.0;

pub const DENSITY_RANGE: RangeInclusive<usize> = 1_000..=50_000;
pub const DEFAULT_DENSITY: usize = 15_000;

/// Written to `u_color` when the shader should choose its own color.
pub const AUTO_COLOR: [f32; 3] = [-1.0, -1.0, -1.0];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ColorSetting {
    /// Let the pattern pick a time-varying color.
    #[default]
    Auto,
    /// Literal color, each channel in `[0, 1]`.
    Rgb([f32; 3]),
}

impl FromStr for ColorSetting {
    type Err = Error;

    /// Accepts `"transparent"`, `"auto"`, `#rrggbb` or `#rgb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") || s.eq_ignore_ascii_case("auto") {
            return Ok(ColorSetting::Auto);
        }
        let invalid = || Error::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        let (r, g, b) = match hex.len() {
            6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                (r * 17, g * 17, b * 17)
            }
            _ => return Err(invalid()),
        };
        Ok(ColorSetting::Rgb([
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
        ]))
    }
}

/// Values the settings panel edits. The renderer never holds on to this;
/// it receives [`UniformValues`] derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub speed: f32,
    pub density: usize,
    pub color: ColorSetting,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            density: DEFAULT_DENSITY,
            color: ColorSetting::Auto,
        }
    }
}

impl Settings {
    /// Copy with speed and density pulled into their supported ranges.
    /// A non-finite speed falls back to the default.
    pub fn clamped(&self) -> Self {
        let speed = if self.speed.is_finite() {
            self.speed
        } else {
            DEFAULT_SPEED
        };
        Self {
            speed: speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end()),
            density: clamp_density(self.density),
            color: self.color,
        }
    }

    pub fn uniforms(&self) -> UniformValues {
        let s = self.clamped();
        UniformValues {
            speed: s.speed / DEFAULT_SPEED,
            density: s.density as f32 / DEFAULT_DENSITY as f32,
            color: match s.color {
                ColorSetting::Auto => AUTO_COLOR,
                ColorSetting::Rgb(rgb) => rgb,
            },
        }
    }
}

pub fn clamp_density(count: usize) -> usize {
    count.clamp(*DENSITY_RANGE.start(), *DENSITY_RANGE.end())
}

/// What actually lands in `u_speed`, `u_density` and `u_color`.
/// Speed and density are normalised so the defaults map to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformValues {
    pub speed: f32,
    pub density: f32,
    pub color: [f32; 3],
}

impl Default for UniformValues {
    fn default() -> Self {
        Settings::default().uniforms()
    }
}
