use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Opaque sRGB background color, 8 bits per channel.
///
/// Parsed from the control layer's `rrggbb` hex strings. A leading `#` is
/// tolerated; nothing else is.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Parses a 6-hex-digit color string.
    pub fn parse_hex(s: &str) -> Result<Self, Error> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidArgument(format!("invalid background color: {s:?}")));
        }

        // All six bytes are ASCII hex digits, so every slice and parse succeeds.
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        Ok(Self::new(channel(0), channel(2), channel(4)))
    }

    /// Channels as straight `f32` in `[0, 1]` (still sRGB encoded).
    #[inline]
    pub fn to_f32(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    /// Clear color for a wgpu render pass.
    ///
    /// wgpu expects linear components; sRGB surfaces re-encode on store.
    pub fn to_wgpu_linear(self) -> wgpu::Color {
        let (r, g, b) = self.to_f32();
        wgpu::Color {
            r: srgb_to_linear(r) as f64,
            g: srgb_to_linear(g) as f64,
            b: srgb_to_linear(b) as f64,
            a: 1.0,
        }
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
