use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Power level stored as a count of half steps, so `6.5` is `Power(13)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Power(u16);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PowerError {
    #[error("power level {0} is not a multiple of 0.5")]
    NotHalfStep(f64),
    #[error("power level {0} is out of range")]
    OutOfRange(f64),
}

impl Power {
    pub const ZERO: Power = Power(0);
    pub const HALF: Power = Power(1);
    pub const ONE: Power = Power(2);

    pub const fn from_half_steps(steps: u16) -> Power {
        Power(steps)
    }

    pub const fn whole(level: u16) -> Power {
        Power(level * 2)
    }

    pub const fn half_steps(self) -> u16 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    pub fn distance(self, other: Power) -> Power {
        Power(self.0.abs_diff(other.0))
    }

    /// Mean rounded to the nearest half step, ties rounding up.
    pub fn mean<I>(levels: I) -> Option<Power>
    where
        I: IntoIterator<Item = Power>,
    {
        let (sum, count) = levels
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), p| (sum + u64::from(p.0), count + 1));
        if count == 0 {
            return None;
        }
        let rounded = (2 * sum + count) / (2 * count);
        Some(Power(rounded as u16))
    }
}

impl TryFrom<f64> for Power {
    type Error = PowerError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 || value * 2.0 > f64::from(u16::MAX) {
            return Err(PowerError::OutOfRange(value));
        }
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 {
            return Err(PowerError::NotHalfStep(value));
        }
        Ok(Power(doubled as u16))
    }
}

impl From<Power> for f64 {
    fn from(power: Power) -> f64 {
        power.as_f64()
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

impl Serialize for Power {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Power {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Power::try_from(value).map_err(serde::de::Error::custom)
    }
}
