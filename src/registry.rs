//! Named material models and the registry that holds them.
//!
//! The built-in models follow the fire-design tables for structural steel
//! (`"EC3"`) and the three reinforcing-steel classes (`"EC2NH"`, `"EC2NC"`,
//! `"EC2X"`). Further models can be inserted at runtime or loaded from JSON of
//! the form `{"MODEL": {"Fy": [12 factors], "E": [12 factors]}}`.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::errors::{RegistryError, ThermalError};
use crate::reduction::{Property, ReductionTable};

/// Reduction tables of one material family, keyed by property.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, ReductionTable>",
    into = "BTreeMap<String, ReductionTable>"
)]
pub struct MaterialModel {
    /// Tables defined by this model.
    tables: BTreeMap<Property, ReductionTable>,
}

impl MaterialModel {
    /// Create a model without any tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the table for `property`, returning the model for chaining.
    #[must_use]
    pub fn with_table(mut self, property: Property, table: ReductionTable) -> Self {
        self.tables.insert(property, table);
        self
    }

    /// The table for `property`, if the model defines one.
    #[must_use]
    pub fn table(&self, property: Property) -> Option<&ReductionTable> {
        self.tables.get(&property)
    }

    /// The table for a string property key, if the key is temperature-sensitive
    /// and the model defines it.
    #[must_use]
    pub fn table_for_key(&self, key: &str) -> Option<&ReductionTable> {
        Property::from_key(key).and_then(|property| self.table(property))
    }

    /// Properties this model has tables for.
    pub fn properties(&self) -> impl Iterator<Item = Property> + '_ {
        self.tables.keys().copied()
    }
}

impl TryFrom<BTreeMap<String, ReductionTable>> for MaterialModel {
    type Error = RegistryError;

    fn try_from(value: BTreeMap<String, ReductionTable>) -> Result<Self, Self::Error> {
        let tables = value
            .into_iter()
            .map(|(key, table)| key.parse::<Property>().map(|property| (property, table)))
            .collect::<Result<_, _>>()?;
        Ok(Self { tables })
    }
}

impl From<MaterialModel> for BTreeMap<String, ReductionTable> {
    fn from(value: MaterialModel) -> Self {
        value
            .tables
            .into_iter()
            .map(|(property, table)| (property.key().to_owned(), table))
            .collect()
    }
}

/// Lookup table from model name to [`MaterialModel`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    /// Registered models by name.
    models: BTreeMap<String, MaterialModel>,
}

impl ModelRegistry {
    /// Create a registry with no models.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an owned registry holding the built-in models.
    ///
    /// Use this as the starting point when adding project-specific models.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.insert("EC3", three_table_model(&EC3));
        registry.insert("EC2NH", three_table_model(&EC2_CLASS_N_HOT_ROLLED));
        registry.insert("EC2NC", three_table_model(&EC2_CLASS_N_COLD_WORKED));
        registry.insert("EC2X", three_table_model(&EC2_CLASS_X));
        registry
    }

    /// The process-wide registry of built-in models.
    ///
    /// # Examples
    /// ```
    /// use thermx::ModelRegistry;
    ///
    /// let names: Vec<&str> = ModelRegistry::builtin().names().collect();
    /// assert!(names.contains(&"EC3"));
    /// ```
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<ModelRegistry> = OnceLock::new();
        BUILTIN.get_or_init(Self::standard)
    }

    /// Parse a registry from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Json`] when the text is malformed, names an
    /// unknown property, or holds a table that fails validation.
    ///
    /// # Examples
    /// ```
    /// use thermx::{ModelRegistry, Property};
    ///
    /// let registry = ModelRegistry::from_json_str(
    ///     r#"{"S355": {"Fy": [1, 1, 1, 1, 0.78, 0.47, 0.23, 0.11, 0.06, 0.04, 0.02, 0]}}"#,
    /// )
    /// .expect("valid registry");
    /// let model = registry.model("S355").expect("model loaded");
    /// assert!(model.table(Property::YieldStrength).is_some());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a registry from a JSON reader.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Json`] under the same conditions as
    /// [`ModelRegistry::from_json_str`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RegistryError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialize the registry as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Register `model` under `name`, returning any model it replaces.
    pub fn insert(&mut self, name: impl Into<String>, model: MaterialModel) -> Option<MaterialModel> {
        self.models.insert(name.into(), model)
    }

    /// Add every model of `other`, replacing models with the same name.
    pub fn extend(&mut self, other: ModelRegistry) {
        self.models.extend(other.models);
    }

    /// Registered model names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Look up a model by name.
    ///
    /// # Errors
    ///
    /// Returns [`ThermalError::UnknownModel`] listing the registered names when
    /// `name` is not registered.
    pub fn model(&self, name: &str) -> Result<&MaterialModel, ThermalError> {
        self.models
            .get(name)
            .ok_or_else(|| ThermalError::UnknownModel {
                model: name.to_owned(),
                available: self.names().map(str::to_owned).collect(),
            })
    }
}

/// Build a model from tables ordered yield strength, proportional limit, modulus.
fn three_table_model(tables: &[ReductionTable; 3]) -> MaterialModel {
    Property::ALL
        .into_iter()
        .zip(tables.iter().copied())
        .fold(MaterialModel::new(), |model, (property, table)| {
            model.with_table(property, table)
        })
}

/// Structural carbon steel.
const EC3: [ReductionTable; 3] = [
    ReductionTable::new([1.0, 1.0, 1.0, 1.0, 0.78, 0.47, 0.23, 0.11, 0.06, 0.04, 0.02, 0.0]),
    ReductionTable::new([1.0, 0.807, 0.613, 0.420, 0.36, 0.18, 0.075, 0.050, 0.0375, 0.025, 0.0125, 0.0]),
    ReductionTable::new([1.0, 0.9, 0.8, 0.7, 0.6, 0.31, 0.13, 0.09, 0.0675, 0.045, 0.0225, 0.0]),
];

/// Reinforcing steel, class N, hot rolled.
const EC2_CLASS_N_HOT_ROLLED: [ReductionTable; 3] = [
    ReductionTable::new([1.0, 1.0, 1.0, 1.0, 0.78, 0.47, 0.23, 0.11, 0.06, 0.04, 0.02, 0.0]),
    ReductionTable::new([1.0, 0.81, 0.61, 0.42, 0.36, 0.18, 0.07, 0.05, 0.04, 0.02, 0.01, 0.0]),
    ReductionTable::new([1.0, 0.9, 0.8, 0.7, 0.6, 0.31, 0.13, 0.09, 0.07, 0.04, 0.02, 0.0]),
];

/// Reinforcing steel, class N, cold worked.
const EC2_CLASS_N_COLD_WORKED: [ReductionTable; 3] = [
    ReductionTable::new([1.0, 1.0, 1.0, 0.94, 0.67, 0.40, 0.12, 0.11, 0.08, 0.05, 0.03, 0.0]),
    ReductionTable::new([0.96, 0.92, 0.81, 0.63, 0.44, 0.26, 0.08, 0.06, 0.05, 0.03, 0.02, 0.0]),
    ReductionTable::new([1.0, 0.87, 0.72, 0.56, 0.40, 0.24, 0.08, 0.06, 0.05, 0.03, 0.02, 0.0]),
];

/// Reinforcing steel, class X.
const EC2_CLASS_X: [ReductionTable; 3] = [
    ReductionTable::new([1.0, 1.0, 1.0, 0.90, 0.70, 0.47, 0.23, 0.11, 0.06, 0.04, 0.02, 0.0]),
    ReductionTable::new([1.0, 0.87, 0.74, 0.70, 0.51, 0.18, 0.07, 0.05, 0.04, 0.02, 0.01, 0.0]),
    ReductionTable::new([1.0, 0.95, 0.90, 0.75, 0.60, 0.31, 0.13, 0.09, 0.07, 0.04, 0.02, 0.0]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduction::BREAKPOINT_COUNT;

    #[test]
    fn builtin_models_define_all_three_tables() {
        let registry = ModelRegistry::builtin();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["EC2NC", "EC2NH", "EC2X", "EC3"]);
        for name in names {
            let model = registry.model(name).expect("built-in model");
            let properties: Vec<Property> = model.properties().collect();
            assert_eq!(properties, Property::ALL);
        }
    }

    #[test]
    fn builtin_tables_pass_runtime_validation() {
        for name in ModelRegistry::builtin().names() {
            let model = ModelRegistry::builtin().model(name).expect("built-in model");
            for property in model.properties() {
                let table = model.table(property).expect("listed property");
                ReductionTable::try_from_slice(table.factors()).expect("valid built-in table");
                assert_eq!(table.factors().len(), BREAKPOINT_COUNT);
            }
        }
    }

    #[test]
    fn ec3_tables_are_non_increasing() {
        let model = ModelRegistry::builtin().model("EC3").expect("EC3 built in");
        for property in Property::ALL {
            let table = model.table(property).expect("EC3 table");
            let mut previous = table.factor(0.0);
            let mut delta = 0.0;
            while delta <= 1_200.0 {
                let current = table.factor(delta);
                assert!(current <= previous + 1.0e-12, "{property} rises at {delta}");
                previous = current;
                delta += 2.5;
            }
        }
    }

    #[test]
    fn unknown_model_lists_available_names() {
        let error = ModelRegistry::builtin()
            .model("EC9")
            .expect_err("EC9 is not registered");
        assert_eq!(
            error,
            ThermalError::UnknownModel {
                model: "EC9".to_owned(),
                available: vec![
                    "EC2NC".to_owned(),
                    "EC2NH".to_owned(),
                    "EC2X".to_owned(),
                    "EC3".to_owned()
                ],
            }
        );
        assert!(error.to_string().contains("EC2NC, EC2NH, EC2X, EC3"));
    }

    #[test]
    fn table_lookup_by_key_ignores_other_keys() {
        let model = ModelRegistry::builtin().model("EC3").expect("EC3 built in");
        assert!(model.table_for_key("Fp").is_some());
        assert!(model.table_for_key("nu").is_none());
        assert!(model.table_for_key("initial_strain").is_none());
    }

    #[test]
    fn json_registry_round_trips() {
        let json = ModelRegistry::standard()
            .to_json_string()
            .expect("registry serializes");
        let parsed = ModelRegistry::from_json_str(&json).expect("registry parses");
        assert_eq!(&parsed, ModelRegistry::builtin());
    }

    #[test]
    fn json_registry_rejects_invalid_tables() {
        let short = r#"{"BAD": {"Fy": [1.0, 0.5]}}"#;
        let error = ModelRegistry::from_json_str(short).expect_err("short table rejected");
        assert!(error.to_string().contains("12 factors"));

        let unknown = r#"{"BAD": {"nu": [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]}}"#;
        let error = ModelRegistry::from_json_str(unknown).expect_err("unknown key rejected");
        assert!(error.to_string().contains("'nu'"));

        let negative = r#"{"BAD": {"E": [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -0.1]}}"#;
        assert!(ModelRegistry::from_json_str(negative).is_err());
    }

    #[test]
    fn loaded_models_extend_the_standard_set() {
        let custom = ModelRegistry::from_reader(
            r#"{"EC3": {"Fy": [1, 1, 1, 1, 0.5, 0.4, 0.3, 0.2, 0.1, 0.05, 0.02, 0]}}"#.as_bytes(),
        )
        .expect("custom registry parses");
        let mut registry = ModelRegistry::standard();
        registry.extend(custom);

        let model = registry.model("EC3").expect("replaced model");
        assert!(model.table(Property::ElasticModulus).is_none());
        assert_eq!(
            model.table(Property::YieldStrength).map(|table| table.factors()[4]),
            Some(0.5)
        );
        assert_eq!(registry.names().count(), 4);
    }
}
