//! Building numbers and the ranges they are accepted in.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Highest building number a signed QR link may carry.
pub const MAX_BUILDING: u16 = 990;

/// Custom building selection range (inclusive).
pub const CUSTOM_BUILDING_RANGE: std::ops::RangeInclusive<u16> = 101..=499;

/// Sentinel sent instead of a building number when none is selected.
pub const ONLINE: &str = "Online";

/// Building validation errors. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildingError {
    #[error("Please enter a valid building between 000 and 990 or use a quick option.")]
    OutOfQrRange,

    #[error("Please enter a valid building number (101-499).")]
    OutOfCustomRange,
}

/// A building number in `0..=990`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct BuildingNumber(u16);

impl BuildingNumber {
    /// Accept any number in `0..=990`.
    pub fn new(n: u16) -> Result<Self, BuildingError> {
        if n <= MAX_BUILDING {
            Ok(Self(n))
        } else {
            Err(BuildingError::OutOfQrRange)
        }
    }

    /// Parse free-text input for the QR dialog. Empty, non-numeric, negative
    /// or out-of-range input is rejected.
    pub fn parse_qr_input(raw: &str) -> Result<Self, BuildingError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BuildingError::OutOfQrRange);
        }
        let n: i64 = trimmed.parse().map_err(|_| BuildingError::OutOfQrRange)?;
        u16::try_from(n)
            .map_err(|_| BuildingError::OutOfQrRange)
            .and_then(Self::new)
    }

    /// Parse free-text input for the custom building field (101–499).
    pub fn parse_custom_input(raw: &str) -> Result<Self, BuildingError> {
        let n: u16 = raw
            .trim()
            .parse()
            .map_err(|_| BuildingError::OutOfCustomRange)?;
        if CUSTOM_BUILDING_RANGE.contains(&n) {
            Ok(Self(n))
        } else {
            Err(BuildingError::OutOfCustomRange)
        }
    }

    /// Accept `n` if it is a quick pick or in the custom range.
    pub fn for_selection(n: u16, quick_picks: &[u16]) -> Result<Self, BuildingError> {
        if quick_picks.contains(&n) && n <= MAX_BUILDING {
            Ok(Self(n))
        } else if CUSTOM_BUILDING_RANGE.contains(&n) {
            Ok(Self(n))
        } else {
            Err(BuildingError::OutOfCustomRange)
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for BuildingNumber {
    type Error = BuildingError;

    fn try_from(n: u16) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<BuildingNumber> for u16 {
    fn from(b: BuildingNumber) -> Self {
        b.0
    }
}

impl fmt::Display for BuildingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `building_Number` on the wire: an integer, or `"Online"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingTag {
    Building(BuildingNumber),
    Online,
}

impl BuildingTag {
    /// `Online` when nothing is selected.
    pub fn from_selection(selection: Option<BuildingNumber>) -> Self {
        selection.map_or(Self::Online, Self::Building)
    }

    pub fn building(self) -> Option<BuildingNumber> {
        match self {
            Self::Building(b) => Some(b),
            Self::Online => None,
        }
    }
}

impl fmt::Display for BuildingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building(b) => write!(f, "{b}"),
            Self::Online => f.write_str(ONLINE),
        }
    }
}

impl Serialize for BuildingTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Building(b) => serializer.serialize_u16(b.get()),
            Self::Online => serializer.serialize_str(ONLINE),
        }
    }
}

impl<'de> Deserialize<'de> for BuildingTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u16),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => BuildingNumber::new(n)
                .map(Self::Building)
                .map_err(serde::de::Error::custom),
            Raw::Text(s) if s == ONLINE => Ok(Self::Online),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "expected building number or \"{ONLINE}\", got \"{s}\""
            ))),
        }
    }
}
