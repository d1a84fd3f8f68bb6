//! Property sets and the pure temperature update that transforms them.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::elongation::{thermal_elongation, ELONGATION_CEILING};
use crate::errors::ThermalError;
use crate::reduction::Property;
use crate::registry::ModelRegistry;

/// Ambient temperature, in °C, at which reference properties are usually given.
pub const DEFAULT_REFERENCE_TEMPERATURE: f64 = 20.0;

/// Key added by [`thermal_update`] for the thermal initial strain.
pub const INITIAL_STRAIN_KEY: &str = "initial_strain";

/// Material property values keyed by name.
///
/// Keys such as `"Fy"`, `"Fp"` and `"E"` are degraded with temperature; any
/// other key is carried through untouched. Units are whatever the caller uses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet {
    /// Values by property key.
    values: BTreeMap<String, f64>,
}

impl PropertySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(key.into(), value)
    }

    /// The value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// The value of a temperature-sensitive property.
    #[must_use]
    pub fn property(&self, property: Property) -> Option<f64> {
        self.get(property.key())
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(key, value)| (key.as_str(), *value))
    }

    /// Iterate over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }
}

impl<K: Into<String>> Extend<(K, f64)> for PropertySet {
    fn extend<I: IntoIterator<Item = (K, f64)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(key, value)| (key.into(), value)));
    }
}

impl IntoIterator for PropertySet {
    type Item = (String, f64);
    type IntoIter = btree_map::IntoIter<String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl ModelRegistry {
    /// Degrade `reference` to `delta_temp` degrees above `reference_temperature`.
    ///
    /// Properties with a table in `model` are scaled by the interpolated
    /// reduction factor; every other property is copied unchanged. The result
    /// also carries [`INITIAL_STRAIN_KEY`], set to minus one hundredth of the
    /// free thermal elongation at the absolute temperature.
    ///
    /// # Errors
    ///
    /// Checks run in this order, and the first failure is returned:
    ///
    /// * [`ThermalError::UnknownModel`] when `model` is not registered;
    /// * [`ThermalError::MissingReductionFactors`] when `reference` holds a
    ///   temperature-sensitive property that `model` has no table for;
    /// * [`ThermalError::TemperatureOutOfRange`] when the absolute temperature
    ///   falls outside `reference_temperature..=1200`.
    pub fn thermal_update(
        &self,
        delta_temp: f64,
        reference: &PropertySet,
        model: &str,
        reference_temperature: f64,
    ) -> Result<PropertySet, ThermalError> {
        let tables = self.model(model)?;

        let missing: Vec<String> = reference
            .keys()
            .filter_map(Property::from_key)
            .filter(|property| tables.table(*property).is_none())
            .map(|property| property.key().to_owned())
            .collect();
        if !missing.is_empty() {
            return Err(ThermalError::MissingReductionFactors {
                model: model.to_owned(),
                properties: missing,
            });
        }

        let temperature = reference_temperature + delta_temp;
        if !(reference_temperature..=ELONGATION_CEILING).contains(&temperature) {
            return Err(ThermalError::TemperatureOutOfRange {
                temperature,
                reference: reference_temperature,
            });
        }

        let mut updated: PropertySet = reference
            .iter()
            .map(|(key, value)| match tables.table_for_key(key) {
                Some(table) => (key, value * table.factor(delta_temp)),
                None => (key, value),
            })
            .collect();
        updated.insert(INITIAL_STRAIN_KEY, -thermal_elongation(temperature)? / 100.0);
        Ok(updated)
    }
}

/// Degrade `reference` with one of the built-in models.
///
/// This is [`ModelRegistry::thermal_update`] on [`ModelRegistry::builtin`].
///
/// # Errors
///
/// See [`ModelRegistry::thermal_update`].
///
/// # Examples
/// ```
/// use approx::assert_relative_eq;
/// use thermx::{thermal_update, PropertySet};
///
/// let reference = PropertySet::from_iter([("Fy", 250.0), ("E", 210_000.0)]);
/// let hot = thermal_update(480.0, &reference, "EC3", 20.0).expect("500 °C is in range");
/// assert_relative_eq!(hot.get("Fy").expect("Fy kept"), 195.0, epsilon = 1.0e-9);
/// assert_relative_eq!(hot.get("E").expect("E kept"), 126_000.0, epsilon = 1.0e-6);
/// ```
pub fn thermal_update(
    delta_temp: f64,
    reference: &PropertySet,
    model: &str,
    reference_temperature: f64,
) -> Result<PropertySet, ThermalError> {
    ModelRegistry::builtin().thermal_update(delta_temp, reference, model, reference_temperature)
}
