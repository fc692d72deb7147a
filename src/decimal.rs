use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Decimal with exactly two fractional digits, stored as hundredths.
///
/// Means and stage values are compared on this type, so two values that
/// print the same are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed2(i64);

impl Fixed2 {
    pub const ZERO: Fixed2 = Fixed2(0);

    pub fn from_hundredths(hundredths: i64) -> Self {
        Fixed2(hundredths)
    }

    /// Rounds half away from zero. `None` for NaN, infinities, and values
    /// outside the i64 hundredths range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * 100.0).round();
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        Some(Fixed2(scaled as i64))
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Fixed2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Fixed2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Fixed2 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = f64::deserialize(deserializer)?;
        Fixed2::from_f64(v).ok_or_else(|| serde::de::Error::custom("decimal out of range"))
    }
}
