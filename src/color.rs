//! Hex colour input parsing.
//!
//! Colour pickers and text fields hand us strings such as `#ffcc00` or
//! `ffcc00`. Only the strict six-digit form is accepted; everything else is
//! rejected so the caller can keep its previous colour.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use palette::Srgb;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?[0-9a-fA-F]{6}$").expect("hex colour pattern is valid")
});

/// An opaque sRGB colour parsed from a six-digit hex string.
///
/// Serializes as `"#rrggbb"`.
///
/// ```
/// use imgdash::HexColor;
///
/// let color = HexColor::parse("abc123").unwrap();
/// assert_eq!(color.to_string(), "#abc123");
/// assert!(HexColor::parse("zzzzzz").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(Srgb<u8>);

impl HexColor {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(Srgb::new(red, green, blue))
    }

    /// Parses `rrggbb` or `#rrggbb`. Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if !HEX_COLOR.is_match(input) {
            return None;
        }
        Srgb::<u8>::from_str(input).ok().map(Self)
    }

    /// Returns the colour as an RGBA pixel with the given alpha.
    pub fn to_rgba(&self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.0.red, self.0.green, self.0.blue, alpha])
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0.red, self.0.green, self.0.blue)
    }
}

/// Error returned when a string is not a six-digit hex colour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a six-digit hex colour: {0:?}")]
pub struct InvalidHexColor(pub String);

impl TryFrom<String> for HexColor {
    type Error = InvalidHexColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(InvalidHexColor(value))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for HexColor {
    fn schema_name() -> String {
        "HexColor".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_with_and_without_hash() {
        assert_eq!(HexColor::parse("abc123"), Some(HexColor::rgb(0xab, 0xc1, 0x23)));
        assert_eq!(HexColor::parse("#ABC123"), Some(HexColor::rgb(0xab, 0xc1, 0x23)));
    }

    #[test]
    fn rejects_non_strict_forms() {
        for input in ["zzzzzz", "#abc", "abc", "#abc1234", "##abc123", "", "rgb(0,0,0)"] {
            assert!(HexColor::parse(input).is_none(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn displays_lowercase_with_hash() {
        assert_eq!(HexColor::rgb(255, 0, 16).to_string(), "#ff0010");
        assert_eq!(HexColor::WHITE.to_string(), "#ffffff");
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&HexColor::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");

        let parsed: HexColor = serde_json::from_str("\"00ff00\"").unwrap();
        assert_eq!(parsed, HexColor::rgb(0, 255, 0));

        assert!(serde_json::from_str::<HexColor>("\"nope\"").is_err());
    }
}
