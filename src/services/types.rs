//! Common types for service replies

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current weather at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Condition text as reported by the provider ("light rain")
    pub description: String,
    /// Degrees Celsius
    pub temperature: f64,
    pub wind_direction: CompassPoint,
    /// Metres per second
    pub wind_speed: f64,
}

/// Eight-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompassPoint {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassPoint {
    const CLOCKWISE: [CompassPoint; 8] = [
        CompassPoint::North,
        CompassPoint::NorthEast,
        CompassPoint::East,
        CompassPoint::SouthEast,
        CompassPoint::South,
        CompassPoint::SouthWest,
        CompassPoint::West,
        CompassPoint::NorthWest,
    ];

    /// Round a meteorological bearing to the nearest 45° sector.
    ///
    /// Halfway bearings round to the even sector (22.5° is north), and 360°
    /// wraps back to north.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // rem_euclid keeps it in 0..8
    pub fn from_degrees(degrees: f64) -> Self {
        let sector = (degrees / 45.0).round_ties_even().rem_euclid(8.0) as usize;
        Self::CLOCKWISE[sector % 8]
    }

    pub fn label(self) -> &'static str {
        match self {
            CompassPoint::North => "north",
            CompassPoint::NorthEast => "north-east",
            CompassPoint::East => "east",
            CompassPoint::SouthEast => "south-east",
            CompassPoint::South => "south",
            CompassPoint::SouthWest => "south-west",
            CompassPoint::West => "west",
            CompassPoint::NorthWest => "north-west",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A completed currency conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub base: String,
    pub target: String,
    pub amount: f64,
    pub result: f64,
}
