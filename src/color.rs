use std::sync::OnceLock;

use regex::Regex;

/// Represents a color in RGBA format.
///
/// This struct encapsulates color information using red, green, blue, and alpha (opacity) channels.
/// Each channel is an 8-bit unsigned integer.
///
/// # Examples
///
/// Creating and manipulating colors:
///
/// ```
/// use impasto::Color;
///
/// // Create a black color
/// let black = Color::BLACK;
///
/// // Create a red color with full opacity
/// let red = Color::rgb(255, 0, 0);
///
/// // Parse the brush-settings hex format
/// let parsed = Color::from_hex("#ff0000");
/// assert_eq!(parsed, Some(red));
///
/// // Normalize the color values to [0.0, 1.0]
/// let normalized = red.normalize();
/// assert_eq!(normalized, [1.0, 0.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color(pub [u8; 4]);

fn hex_color_regex() -> &'static Regex {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    HEX_COLOR.get_or_init(|| {
        Regex::new(r"^#(?:([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})|([0-9a-fA-F])([0-9a-fA-F])([0-9a-fA-F]))$")
            .expect("hex color pattern is valid")
    })
}

impl Color {
    /// A transparent color.
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    /// A black color with full opacity.
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    /// A white color with full opacity.
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    /// Creates a new color with the specified RGB values and full opacity.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Creates a new color with the specified RGBA values.
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Parses a `#rrggbb` or `#rgb` hex string, the format the brush-color
    /// setting is delivered in.
    ///
    /// Returns `None` when the string does not match either form.
    ///
    /// # Examples
    ///
    /// ```
    /// use impasto::Color;
    ///
    /// assert_eq!(Color::from_hex("#102030"), Some(Color::rgb(0x10, 0x20, 0x30)));
    /// assert_eq!(Color::from_hex("#f00"), Some(Color::rgb(255, 0, 0)));
    /// assert_eq!(Color::from_hex("red"), None);
    /// ```
    pub fn from_hex(hex: &str) -> Option<Self> {
        let captures = hex_color_regex().captures(hex)?;

        let wide = |index: usize| {
            captures
                .get(index)
                .and_then(|m| u8::from_str_radix(m.as_str(), 16).ok())
        };
        let narrow = |index: usize| {
            captures
                .get(index)
                .and_then(|m| u8::from_str_radix(m.as_str(), 16).ok())
                .map(|nibble| nibble * 0x11)
        };

        if let (Some(r), Some(g), Some(b)) = (wide(1), wide(2), wide(3)) {
            return Some(Self::rgb(r, g, b));
        }
        if let (Some(r), Some(g), Some(b)) = (narrow(4), narrow(5), narrow(6)) {
            return Some(Self::rgb(r, g, b));
        }
        None
    }

    /// Normalizes the color values to the range [0.0, 1.0].
    pub fn normalize(&self) -> [f32; 4] {
        [
            self.0[0] as f32 / 255.0,
            self.0[1] as f32 / 255.0,
            self.0[2] as f32 / 255.0,
            self.0[3] as f32 / 255.0,
        ]
    }

    /// The RGB channels normalized to [0.0, 1.0], dropping alpha.
    pub fn normalize_rgb(&self) -> [f32; 3] {
        let [r, g, b, _] = self.normalize();
        [r, g, b]
    }

    /// Returns the color as an array of 4 `u8` values.
    pub fn to_array(&self) -> [u8; 4] {
        self.0
    }
}

/// A premultiplied linear RGBA color: the RGB channels are already scaled by
/// alpha, which makes repeated "over" compositing a pair of multiply-adds.
///
/// This is the texel format of the paint surface and the value the stamp
/// compositor works in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PremulRgba(pub [f32; 4]);

impl PremulRgba {
    pub const TRANSPARENT: Self = Self([0.0, 0.0, 0.0, 0.0]);

    /// Premultiplies a straight RGB color by `alpha`.
    pub fn from_straight(rgb: [f32; 3], alpha: f32) -> Self {
        Self([rgb[0] * alpha, rgb[1] * alpha, rgb[2] * alpha, alpha])
    }

    pub fn alpha(&self) -> f32 {
        self.0[3]
    }

    /// Standard premultiplied "over" compositing: `self` drawn on top of
    /// `dst`.
    ///
    /// When `self` has zero alpha (and zero premultiplied channels) the
    /// result is `dst`, bit for bit: `x * 1.0` and `0.0 + x` are exact in
    /// IEEE arithmetic. The compositor relies on this so that stamps outside
    /// the brush footprint leave texels untouched.
    pub fn over(&self, dst: PremulRgba) -> PremulRgba {
        let inverse = 1.0 - self.0[3];
        PremulRgba([
            self.0[0] + inverse * dst.0[0],
            self.0[1] + inverse * dst.0[1],
            self.0[2] + inverse * dst.0[2],
            self.0[3] + inverse * dst.0[3],
        ])
    }
}
