//! Colors and the per-instance palette cursor used for solid bubbles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB color with a floating point alpha channel.
///
/// Serialized as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Rgba { r, g, b, a }
    }

    /// Same color with its alpha multiplied by `factor` (clamped to [0, 1]).
    pub fn scale_alpha(self, factor: f32) -> Self {
        Rgba {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}': expected #RRGGBB or #RRGGBBAA", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Rgba {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let a = if hex.len() == 8 {
            channel(6)? as f32 / 255.0
        } else {
            1.0
        };
        Ok(Rgba {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }
}

impl TryFrom<String> for Rgba {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, a)
        }
    }
}

/// Rotating cursor over a palette.
///
/// Owned by one simulation instance so that several instances never share a rotation.
#[derive(Debug, Clone)]
pub struct PaletteCursor {
    colors: Vec<Rgba>,
    index: usize,
}

/// Used when a cursor is built over an empty palette.
const FALLBACK: Rgba = Rgba::rgb(0x80, 0x80, 0x80);

impl PaletteCursor {
    pub fn new(colors: Vec<Rgba>) -> Self {
        PaletteCursor { colors, index: 0 }
    }

    /// Returns the next color in rotation order
    pub fn next_color(&mut self) -> Rgba {
        if self.colors.is_empty() {
            return FALLBACK;
        }
        let color = self.colors[self.index % self.colors.len()];
        self.index = (self.index + 1) % self.colors.len();
        color
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
