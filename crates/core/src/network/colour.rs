use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{NetworkError, Result};

static HEX_COLOUR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})$")
        .expect("failed to compile hex colour regex")
});

/// RGB line colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Colour {
    /// Build from raw components, rejecting anything outside `0..=255`.
    pub fn from_components(components: [i64; 3]) -> Result<Self> {
        let mut channels = [0u8; 3];
        for (channel, value) in channels.iter_mut().zip(components) {
            *channel = u8::try_from(value).map_err(|_| {
                NetworkError::invalid(format!(
                    "colour components must be between 0 and 255, got {value}"
                ))
            })?;
        }
        let [r, g, b] = channels;
        Ok(Self { r, g, b })
    }

    /// Lower-case `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Colour {
    type Err = NetworkError;

    /// Parse `#rrggbb` (the leading `#` is optional).
    fn from_str(value: &str) -> Result<Self> {
        let caps = HEX_COLOUR_RE
            .captures(value.trim())
            .ok_or_else(|| NetworkError::invalid(format!("'{value}' is not a #rrggbb colour")))?;
        let mut channels = [0i64; 3];
        for (index, channel) in channels.iter_mut().enumerate() {
            let digits = caps.get(index + 1).map(|m| m.as_str()).unwrap_or_default();
            *channel = i64::from_str_radix(digits, 16)
                .map_err(|err| NetworkError::invalid(format!("bad colour '{value}': {err}")))?;
        }
        Self::from_components(channels)
    }
}

impl Serialize for Colour {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Colour {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
