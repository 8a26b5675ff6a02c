//! RGB color representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    #[serde(rename = "r")]
    pub(crate) red: u8,
    #[serde(rename = "g")]
    pub(crate) green: u8,
    #[serde(rename = "b")]
    pub(crate) blue: u8,
}

impl Color {
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Upper-case `#RRGGBB` form.
    ///
    /// ```
    /// use wiz_controller::Color;
    ///
    /// assert_eq!(Color::rgb(255, 120, 48).to_hex(), "#FF7830");
    /// ```
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }

    fn from_hex(hex: &str) -> Option<Self> {
        // from_str_radix alone would let a sign through
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn from_triplet(s: &str) -> Option<Self> {
        let parts = s
            .split(',')
            .map(|c| c.trim().parse::<u8>().ok())
            .collect::<Option<Vec<u8>>>()?;
        match parts.as_slice() {
            [r, g, b] => Some(Self::rgb(*r, *g, *b)),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse either `r,g,b` or `#RRGGBB`.
    ///
    /// ```
    /// use std::str::FromStr;
    /// use wiz_controller::Color;
    ///
    /// assert_eq!(Color::from_str("255,128,0").unwrap(), Color::rgb(255, 128, 0));
    /// assert_eq!(Color::from_str("#00b450").unwrap(), Color::rgb(0, 180, 80));
    /// assert!(Color::from_str("300,0,0").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        let parsed = match s.strip_prefix('#') {
            Some(hex) => Self::from_hex(hex),
            None => Self::from_triplet(s),
        };
        parsed.ok_or_else(|| Error::invalid_parameter("color", s, "expected r,g,b or #RRGGBB"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_and_garbled_input() {
        assert!(Color::from_str("1,2").is_err());
        assert!(Color::from_str("1,2,3,4").is_err());
        assert!(Color::from_str("#12345").is_err());
        assert!(Color::from_str("#GG0000").is_err());
        assert!(Color::from_str("red").is_err());
        assert!(Color::from_str("#+1+2+3").is_err());
        assert!(Color::from_str("#-10000").is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        let color = Color::from_str("#FF7830").unwrap();
        assert_eq!(color.to_hex(), "#FF7830");
        assert_eq!(color.to_string(), "255,120,48");
    }
}
