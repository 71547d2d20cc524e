//! Fixed-point math utilities for deterministic simulation.
//!
//! Damage multipliers, falloff exponents and the turn counter are
//! fractional; everything else in the engine is an integer.

use fixed::types::I32F32;

/// Fixed-point number type for all fractional simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// One half, the amount the turn counter advances per turn change.
pub const HALF: Fixed = Fixed::from_bits(1 << 31);

/// Raise `base` to a non-negative integer power.
///
/// `pow(x, 0)` is one for every `x`, including zero.
#[must_use]
pub fn pow(base: Fixed, exponent: u32) -> Fixed {
    let mut result = Fixed::ONE;
    for _ in 0..exponent {
        result = result.saturating_mul(base);
    }
    result
}

/// Round to the nearest integer, ties to even.
#[must_use]
pub fn round_to_i32(value: Fixed) -> i32 {
    value.round_ties_to_even().saturating_to_num::<i32>()
}

/// Serde support for fixed-point numbers written as decimals.
///
/// Data files are hand-authored, so values are read as plain decimals
/// (`0.5`) and converted once at load time.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of range")))
    }
}

/// Serde support for fixed-point numbers as raw bits.
///
/// Used for state that is hashed or compared, where the exact
/// representation matters.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}
