//! Tabulated reduction factors and the segment interpolator that reads them.
//!
//! Each table holds the ratio between a property at elevated temperature and
//! the same property at the reference temperature. Entry `i` is measured at an
//! offset of `80 + 100 * i` degrees above the reference, so with the usual
//! 20 °C reference the entries line up with 100, 200, ..., 1200 °C.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;

/// Number of tabulated breakpoints in every reduction-factor table.
pub const BREAKPOINT_COUNT: usize = 12;

/// Offset above the reference temperature of the first tabulated breakpoint.
pub const FIRST_BREAKPOINT_OFFSET: f64 = 80.0;

/// Spacing between consecutive tabulated breakpoints.
pub const BREAKPOINT_SPACING: f64 = 100.0;

/// Temperature-sensitive mechanical properties that may carry a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Property {
    /// Effective yield strength, keyed `"Fy"`.
    #[serde(rename = "Fy")]
    YieldStrength,
    /// Proportional-limit stress, keyed `"Fp"`.
    #[serde(rename = "Fp")]
    ProportionalLimit,
    /// Slope of the linear elastic range, keyed `"E"`.
    #[serde(rename = "E")]
    ElasticModulus,
}

impl Property {
    /// Every temperature-sensitive property in table order.
    pub const ALL: [Property; 3] = [
        Property::YieldStrength,
        Property::ProportionalLimit,
        Property::ElasticModulus,
    ];

    /// The string key used in property sets and registry data.
    ///
    /// # Examples
    /// ```
    /// use thermx::Property;
    ///
    /// assert_eq!(Property::ElasticModulus.key(), "E");
    /// ```
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Property::YieldStrength => "Fy",
            Property::ProportionalLimit => "Fp",
            Property::ElasticModulus => "E",
        }
    }

    /// Look up a property by its string key, returning `None` for keys that
    /// carry no temperature dependence.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|property| property.key() == key)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Property {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| RegistryError::UnknownProperty(s.to_owned()))
    }
}

/// An ordered, validated list of reduction factors at the fixed breakpoints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(into = "Vec<f64>")]
pub struct ReductionTable([f64; BREAKPOINT_COUNT]);

impl ReductionTable {
    /// Build a table from the built-in data, which is known to be in range.
    #[must_use]
    pub(crate) const fn new(factors: [f64; BREAKPOINT_COUNT]) -> Self {
        Self(factors)
    }

    /// Build a table from runtime data, checking that it has exactly
    /// [`BREAKPOINT_COUNT`] finite entries in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TableLength`] for a table of the wrong size and
    /// [`RegistryError::InvalidFactor`] for an entry outside `[0, 1]`.
    ///
    /// # Examples
    /// ```
    /// use thermx::{ReductionTable, RegistryError};
    ///
    /// let error = ReductionTable::try_from_slice(&[1.0, 0.5]).expect_err("too short");
    /// assert!(matches!(error, RegistryError::TableLength { found: 2 }));
    /// ```
    pub fn try_from_slice(factors: &[f64]) -> Result<Self, RegistryError> {
        let table: [f64; BREAKPOINT_COUNT] = factors
            .try_into()
            .map_err(|_| RegistryError::TableLength {
                found: factors.len(),
            })?;
        if let Some((index, &value)) = table
            .iter()
            .enumerate()
            .find(|(_, value)| !(0.0..=1.0).contains(*value))
        {
            return Err(RegistryError::InvalidFactor { index, value });
        }
        Ok(Self(table))
    }

    /// The raw factors in breakpoint order.
    #[must_use]
    pub const fn factors(&self) -> &[f64; BREAKPOINT_COUNT] {
        &self.0
    }

    /// Temperature offset above the reference at which entry `index` applies.
    #[must_use]
    pub fn breakpoint_offset(index: usize) -> f64 {
        FIRST_BREAKPOINT_OFFSET + BREAKPOINT_SPACING * index as f64
    }

    /// Interpolate the reduction factor at `delta` degrees above the reference.
    ///
    /// Offsets below zero are treated as zero. Below the first breakpoint the
    /// factor falls linearly from `1.0` at zero offset to the first entry. Between breakpoints it is linear in each
    /// 100-degree segment, and at or past the last breakpoint it holds the last
    /// entry.
    ///
    /// # Examples
    /// ```
    /// use thermx::ModelRegistry;
    /// use thermx::Property;
    ///
    /// let ec3 = ModelRegistry::builtin().model("EC3").expect("EC3 is built in");
    /// let table = ec3.table(Property::YieldStrength).expect("EC3 defines Fy");
    /// assert_eq!(table.factor(480.0), 0.78);
    /// assert_eq!(table.factor(2_000.0), 0.0);
    /// ```
    #[must_use]
    pub fn factor(&self, delta: f64) -> f64 {
        let table = &self.0;
        let delta = delta.max(0.0);
        if delta <= FIRST_BREAKPOINT_OFFSET {
            return 1.0 - (delta / FIRST_BREAKPOINT_OFFSET) * (1.0 - table[0]);
        }

        // Float-to-int casts saturate, so huge offsets land past the last segment.
        let segment = ((delta - FIRST_BREAKPOINT_OFFSET) / BREAKPOINT_SPACING).floor() as usize;
        if segment >= BREAKPOINT_COUNT - 1 {
            return table[BREAKPOINT_COUNT - 1];
        }

        let low = table[segment];
        let high = table[segment + 1];
        let xi = (delta - Self::breakpoint_offset(segment)) / BREAKPOINT_SPACING;
        low - xi * (low - high)
    }
}

impl From<ReductionTable> for Vec<f64> {
    fn from(value: ReductionTable) -> Self {
        value.0.to_vec()
    }
}

impl TryFrom<Vec<f64>> for ReductionTable {
    type Error = RegistryError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::try_from_slice(&value)
    }
}

impl TryFrom<[f64; BREAKPOINT_COUNT]> for ReductionTable {
    type Error = RegistryError;

    fn try_from(value: [f64; BREAKPOINT_COUNT]) -> Result<Self, Self::Error> {
        Self::try_from_slice(&value)
    }
}

impl<'de> Deserialize<'de> for ReductionTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let factors = Vec::<f64>::deserialize(deserializer)?;
        Self::try_from_slice(&factors).map_err(serde::de::Error::custom)
    }
}
