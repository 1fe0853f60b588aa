use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ColorParseError;

/// Largest Euclidean distance between two colors, used to normalize
/// [`color_similarity`] into `[0, 1]`.
pub const MAX_COLOR_DISTANCE: f32 = 441.672_96;

/// A straight (not premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RgbaColor {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// A pixel is empty when all four channels are zero.
    ///
    /// Fully transparent black drawn on purpose is indistinguishable from
    /// an untouched pixel; flood fill and the selection tools rely on that.
    pub fn is_empty(&self) -> bool {
        u16::from(self.r) + u16::from(self.g) + u16::from(self.b) + u16::from(self.a) == 0
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }

    /// Scales the alpha channel by `factor` (clamped to `[0, 1]`).
    pub fn with_opacity(self, factor: f32) -> Self {
        let a = (f32::from(self.a) * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    pub fn to_hex(self) -> String {
        rgba_to_hex(self)
    }
}

impl From<RgbaColor> for egui::Color32 {
    fn from(c: RgbaColor) -> Self {
        egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
    }
}

impl Serialize for RgbaColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&rgba_to_hex(*self))
    }
}

impl<'de> Deserialize<'de> for RgbaColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex_to_rgba(&hex).map_err(serde::de::Error::custom)
    }
}

/// Formats a color as `#rrggbbaa`.
pub fn rgba_to_hex(c: RgbaColor) -> String {
    format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
}

/// Parses `#rrggbbaa` or `#rrggbb` (leading `#` optional). Six digit input is opaque.
pub fn hex_to_rgba(hex: &str) -> Result<RgbaColor, ColorParseError> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 && digits.len() != 8 {
        return Err(ColorParseError::InvalidLength(hex.to_owned()));
    }
    if !digits.is_ascii() {
        return Err(ColorParseError::InvalidDigit(hex.to_owned()));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| ColorParseError::InvalidDigit(hex.to_owned()))
    };

    let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
    Ok(RgbaColor::new(channel(0)?, channel(2)?, channel(4)?, alpha))
}

/// Euclidean distance over all four channels.
pub fn color_distance(a: RgbaColor, b: RgbaColor) -> f32 {
    let d = |x: u8, y: u8| {
        let v = f32::from(x) - f32::from(y);
        v * v
    };
    (d(a.r, b.r) + d(a.g, b.g) + d(a.b, b.b) + d(a.a, b.a)).sqrt()
}

/// Normalized distance in `[0, 1]`: `0` for identical colors.
///
/// The four-channel distance can exceed [`MAX_COLOR_DISTANCE`], so the result is clamped.
pub fn color_similarity(a: RgbaColor, b: RgbaColor) -> f32 {
    (color_distance(a, b) / MAX_COLOR_DISTANCE).min(1.0)
}

/// Converts a premultiplied pixel back to straight alpha.
///
/// A zero alpha yields transparent black no matter what the color channels hold.
pub fn unpremultiply([r, g, b, a]: [u8; 4]) -> RgbaColor {
    if a == 0 {
        return RgbaColor::TRANSPARENT;
    }
    let alpha = f32::from(a) / 255.0;
    let channel = |c: u8| (f32::from(c) / alpha).round().clamp(0.0, 255.0) as u8;
    RgbaColor::new(channel(r), channel(g), channel(b), a)
}

pub fn premultiply(c: RgbaColor) -> [u8; 4] {
    let alpha = f32::from(c.a) / 255.0;
    let channel = |v: u8| (f32::from(v) * alpha).round() as u8;
    [channel(c.r), channel(c.g), channel(c.b), c.a]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        for c in [
            RgbaColor::new(0, 0, 0, 0),
            RgbaColor::new(255, 255, 255, 255),
            RgbaColor::new(18, 52, 86, 120),
            RgbaColor::new(1, 2, 3, 4),
        ] {
            assert_eq!(hex_to_rgba(&rgba_to_hex(c)).unwrap(), c);
        }
    }

    #[test]
    fn test_hex_without_alpha_is_opaque() {
        assert_eq!(hex_to_rgba("#ff8000").unwrap(), RgbaColor::opaque(255, 128, 0));
        assert_eq!(hex_to_rgba("00ff00").unwrap(), RgbaColor::opaque(0, 255, 0));
    }

    #[test]
    fn test_invalid_hex_is_rejected() {
        assert!(matches!(hex_to_rgba("#fff"), Err(ColorParseError::InvalidLength(_))));
        assert!(matches!(hex_to_rgba("#gg0000"), Err(ColorParseError::InvalidDigit(_))));
    }

    #[test]
    fn test_similarity_bounds() {
        let c = RgbaColor::new(10, 20, 30, 40);
        assert_eq!(color_similarity(c, c), 0.0);

        let other = RgbaColor::new(200, 0, 90, 255);
        assert_eq!(color_similarity(c, other), color_similarity(other, c));

        let max = color_similarity(RgbaColor::TRANSPARENT, RgbaColor::WHITE);
        assert!((max - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unpremultiply_zero_alpha_is_transparent() {
        assert_eq!(unpremultiply([12, 40, 200, 0]), RgbaColor::TRANSPARENT);
        assert_eq!(unpremultiply([51, 0, 0, 51]), RgbaColor::new(255, 0, 0, 51));
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(RgbaColor::TRANSPARENT.is_empty());
        assert!(!RgbaColor::new(0, 0, 0, 1).is_empty());
    }
}
