//! Trend code mapping.
//!
//! The portal reports a trend per reading either as a textual code
//! (`"RISING_QUICKLY"`) or as a numeric level 1..=7, sometimes delivered as a
//! quoted number. The downstream monitoring tool expects one of eight
//! canonical direction strings.

use serde::{Deserialize, Serialize};

/// Trend as delivered by the portal: numeric level or textual code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrendCode {
    Numeric(i64),
    Text(String),
}

/// Canonical direction understood by the downstream tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
    #[serde(rename = "NONE")]
    None,
}

impl Direction {
    /// String form used in the output record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::DoubleUp => "DoubleUp",
            Direction::SingleUp => "SingleUp",
            Direction::FortyFiveUp => "FortyFiveUp",
            Direction::Flat => "Flat",
            Direction::FortyFiveDown => "FortyFiveDown",
            Direction::SingleDown => "SingleDown",
            Direction::DoubleDown => "DoubleDown",
            Direction::None => "NONE",
        }
    }

    /// Map a portal trend code to a canonical direction.
    ///
    /// Numeric levels run 1 (falling quickly) through 7 (rising quickly).
    /// Textual codes follow the portal's vocabulary. A numeric level given as
    /// a string maps the same as the integer. Anything unrecognized maps to
    /// [`Direction::None`], never an error.
    pub fn from_trend_code(code: Option<&TrendCode>) -> Direction {
        match code {
            Some(TrendCode::Numeric(n)) => Self::from_level(*n),
            Some(TrendCode::Text(s)) => {
                if let Ok(n) = s.trim().parse::<i64>() {
                    return Self::from_level(n);
                }
                match s.trim().to_ascii_uppercase().as_str() {
                    "RISING_QUICKLY" => Direction::DoubleUp,
                    "RISING" => Direction::SingleUp,
                    "RISING_SLIGHTLY" => Direction::FortyFiveUp,
                    "STABLE" => Direction::Flat,
                    "FALLING_SLIGHTLY" => Direction::FortyFiveDown,
                    "FALLING" => Direction::SingleDown,
                    "FALLING_QUICKLY" => Direction::DoubleDown,
                    _ => Direction::None,
                }
            }
            None => Direction::None,
        }
    }

    fn from_level(level: i64) -> Direction {
        match level {
            1 => Direction::DoubleDown,
            2 => Direction::SingleDown,
            3 => Direction::FortyFiveDown,
            4 => Direction::Flat,
            5 => Direction::FortyFiveUp,
            6 => Direction::SingleUp,
            7 => Direction::DoubleUp,
            _ => Direction::None,
        }
    }
}
