//! Stateful shell that keeps an external model in step with temperature.
//!
//! A [`DegradationController`] names the material model to use. Initializing
//! it against an external model declares one parameter per tracked property,
//! binds each to every element and yields a [`BoundController`]. The bound
//! controller keeps only the reference properties and the handle table, so
//! each update is recomputed from the reference state and pushing the same
//! temperature twice pushes the same values.

use log::{debug, trace};

use crate::errors::{ControllerError, ThermalError};
use crate::parameters::{BindScope, ParameterHandle, ParameterModel};
use crate::properties::{PropertySet, INITIAL_STRAIN_KEY};
use crate::reduction::Property;
use crate::registry::ModelRegistry;

/// Key of the initial-strain component pushed alongside [`INITIAL_STRAIN_KEY`].
pub const ALIASED_INITIAL_STRAIN_KEY: &str = "eps0_11";

/// Properties the controller drives in the external model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackedKey {
    /// Yield strength, `"Fy"`.
    YieldStrength,
    /// Elastic modulus, `"E"`.
    ElasticModulus,
    /// Thermal initial strain, `"initial_strain"`.
    InitialStrain,
    /// Axial component of the initial strain, `"eps0_11"`.
    AliasedInitialStrain,
}

impl TrackedKey {
    /// Every tracked key in handle-table order.
    pub const ALL: [TrackedKey; 4] = [
        TrackedKey::YieldStrength,
        TrackedKey::ElasticModulus,
        TrackedKey::InitialStrain,
        TrackedKey::AliasedInitialStrain,
    ];

    /// Property name the external model binds this key under.
    #[must_use]
    pub const fn property_name(self) -> &'static str {
        match self {
            TrackedKey::YieldStrength => Property::YieldStrength.key(),
            TrackedKey::ElasticModulus => Property::ElasticModulus.key(),
            TrackedKey::InitialStrain => INITIAL_STRAIN_KEY,
            TrackedKey::AliasedInitialStrain => ALIASED_INITIAL_STRAIN_KEY,
        }
    }

    /// Position of this key in the handle table.
    const fn slot(self) -> usize {
        match self {
            TrackedKey::YieldStrength => 0,
            TrackedKey::ElasticModulus => 1,
            TrackedKey::InitialStrain => 2,
            TrackedKey::AliasedInitialStrain => 3,
        }
    }
}

/// Fixed table of parameter handles, one per [`TrackedKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterBinding {
    /// Handles indexed by [`TrackedKey::slot`].
    handles: [ParameterHandle; 4],
}

impl ParameterBinding {
    /// Handle bound to `key`.
    #[must_use]
    pub const fn handle(&self, key: TrackedKey) -> ParameterHandle {
        self.handles[key.slot()]
    }

    /// Tracked keys with their handles in table order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackedKey, ParameterHandle)> + '_ {
        TrackedKey::ALL
            .into_iter()
            .map(move |key| (key, self.handle(key)))
    }
}

/// Controller that has not been attached to an external model yet.
///
/// # Examples
/// ```
/// use thermx::{point, DegradationController, PropertySet, Truss};
///
/// let mut truss = Truss::new();
/// let a = truss.add_joint(point(0.0, 0.0, 0.0));
/// let b = truss.add_joint(point(1_000.0, 0.0, 0.0));
/// let member = truss.add_member(a, b);
/// truss.set_member_properties(member, 100.0, 210_000.0).expect("valid member");
///
/// let reference = PropertySet::from_iter([("Fy", 250.0), ("E", 210_000.0)]);
/// let controller = DegradationController::new("EC3")
///     .initialize(&mut truss, 20.0, reference)
///     .expect("controller binds");
/// let pushed = controller.update(&mut truss, 500.0).expect("500 °C is in range");
/// assert_eq!(pushed.get("Fy"), Some(195.0));
/// ```
#[derive(Clone, Debug)]
pub struct DegradationController<'r> {
    /// Registry the material model is looked up in.
    registry: &'r ModelRegistry,
    /// Name of the material model.
    model: String,
}

impl DegradationController<'static> {
    /// Create a controller for one of the built-in material models.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_registry(ModelRegistry::builtin(), model)
    }
}

impl<'r> DegradationController<'r> {
    /// Create a controller for a model in a caller-supplied registry.
    #[must_use]
    pub fn with_registry(registry: &'r ModelRegistry, model: impl Into<String>) -> Self {
        Self {
            registry,
            model: model.into(),
        }
    }

    /// Bind the controller to `target` with `reference` properties measured at
    /// `reference_temperature`.
    ///
    /// The reference set is validated against the material model before the
    /// external model is touched. Four parameters are then declared and bound
    /// to the all-sections scope of every element, and the reference yield
    /// strength and modulus are pushed. Strain parameters keep whatever default
    /// the external model gives them until the first [`BoundController::update`].
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Thermal`] when the material model is unknown or
    /// lacks a table for a reference property,
    /// [`ControllerError::MissingReferenceProperty`] when `reference` has no
    /// `"Fy"` or `"E"`, and [`ControllerError::Model`] with the external model's
    /// own error when declaring, binding or pushing fails.
    pub fn initialize<M: ParameterModel>(
        self,
        target: &mut M,
        reference_temperature: f64,
        reference: PropertySet,
    ) -> Result<BoundController<'r>, ControllerError<M::Error>> {
        for key in [TrackedKey::YieldStrength, TrackedKey::ElasticModulus] {
            if !reference.contains_key(key.property_name()) {
                return Err(ControllerError::MissingReferenceProperty(
                    key.property_name().to_owned(),
                ));
            }
        }
        self.registry
            .thermal_update(0.0, &reference, &self.model, reference_temperature)?;

        let mut handles = [ParameterHandle::new(0); 4];
        for key in TrackedKey::ALL {
            handles[key.slot()] = target.declare_parameter().map_err(ControllerError::Model)?;
        }
        let binding = ParameterBinding { handles };

        let elements = target.element_ids();
        for element in &elements {
            for (key, handle) in binding.iter() {
                target
                    .bind_parameter(handle, *element, BindScope::AllSections, key.property_name())
                    .map_err(ControllerError::Model)?;
            }
        }
        debug!(
            "bound {} parameters to {} elements for model '{}'",
            TrackedKey::ALL.len(),
            elements.len(),
            self.model
        );

        for key in [TrackedKey::YieldStrength, TrackedKey::ElasticModulus] {
            let value = tracked_value(&reference, key)?;
            push(target, binding.handle(key), key, value)?;
        }

        Ok(BoundController {
            registry: self.registry,
            model: self.model,
            reference_temperature,
            reference,
            binding,
        })
    }
}

/// Controller attached to an external model through a fixed handle table.
#[derive(Clone, Debug)]
pub struct BoundController<'r> {
    /// Registry the material model is looked up in.
    registry: &'r ModelRegistry,
    /// Name of the material model.
    model: String,
    /// Temperature at which the reference properties were measured.
    reference_temperature: f64,
    /// Properties at the reference temperature.
    reference: PropertySet,
    /// Handles obtained during initialization.
    binding: ParameterBinding,
}

impl<'r> BoundController<'r> {
    /// Name of the material model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Temperature at which the reference properties were measured.
    #[must_use]
    pub const fn reference_temperature(&self) -> f64 {
        self.reference_temperature
    }

    /// Properties at the reference temperature.
    #[must_use]
    pub const fn reference(&self) -> &PropertySet {
        &self.reference
    }

    /// Handles bound to the external model.
    #[must_use]
    pub const fn binding(&self) -> &ParameterBinding {
        &self.binding
    }

    /// Compute the properties for `temperature` without touching any model.
    ///
    /// The result is the degraded reference set plus the initial strain under
    /// both [`INITIAL_STRAIN_KEY`] and [`ALIASED_INITIAL_STRAIN_KEY`].
    ///
    /// # Errors
    ///
    /// Returns the [`ThermalError`] raised by the update.
    pub fn degraded_properties(&self, temperature: f64) -> Result<PropertySet, ThermalError> {
        let delta = temperature - self.reference_temperature;
        let mut properties = self.registry.thermal_update(
            delta,
            &self.reference,
            &self.model,
            self.reference_temperature,
        )?;
        if let Some(strain) = properties.get(INITIAL_STRAIN_KEY) {
            properties.insert(ALIASED_INITIAL_STRAIN_KEY, strain);
        }
        Ok(properties)
    }

    /// Degrade the reference properties to `temperature` and push every
    /// tracked value into `target`, returning the full degraded set.
    ///
    /// Nothing is pushed if the update is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Thermal`] for temperatures outside the
    /// reference to 1200 °C range and [`ControllerError::Model`] when the
    /// external model refuses a value.
    pub fn update<M: ParameterModel>(
        &self,
        target: &mut M,
        temperature: f64,
    ) -> Result<PropertySet, ControllerError<M::Error>> {
        let properties = self.degraded_properties(temperature)?;
        debug!("pushing '{}' properties at {temperature} °C", self.model);
        for (key, handle) in self.binding.iter() {
            let value = tracked_value(&properties, key)?;
            push(target, handle, key, value)?;
        }
        Ok(properties)
    }

    /// Read every tracked value back from `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Model`] when the external model cannot
    /// report a parameter.
    pub fn current_values<M: ParameterModel>(
        &self,
        target: &M,
    ) -> Result<PropertySet, ControllerError<M::Error>> {
        self.binding
            .iter()
            .map(|(key, handle)| {
                target
                    .parameter_value(handle)
                    .map(|value| (key.property_name(), value))
                    .map_err(ControllerError::Model)
            })
            .collect()
    }
}

/// Value of a tracked key in `properties`.
fn tracked_value<E>(properties: &PropertySet, key: TrackedKey) -> Result<f64, ControllerError<E>> {
    properties
        .get(key.property_name())
        .ok_or_else(|| ControllerError::MissingReferenceProperty(key.property_name().to_owned()))
}

/// Push one value through its handle.
fn push<M: ParameterModel>(
    target: &mut M,
    handle: ParameterHandle,
    key: TrackedKey,
    value: f64,
) -> Result<(), ControllerError<M::Error>> {
    trace!("{handle} ({}) <- {value}", key.property_name());
    target
        .set_parameter_value(handle, value)
        .map_err(ControllerError::Model)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use thiserror::Error;

    use super::*;

    /// Failure injected by the recording model.
    #[derive(Debug, Error, PartialEq)]
    enum RecordingError {
        /// Unknown handle.
        #[error("no parameter {0}")]
        Unknown(usize),
        /// Refusal configured by the test.
        #[error("refused {0}")]
        Refused(&'static str),
    }

    /// In-memory model that records every call made through the boundary.
    #[derive(Debug, Default)]
    struct RecordingModel {
        /// Element identifiers reported by the model.
        elements: Vec<u32>,
        /// Current parameter values, defaulting to zero.
        values: Vec<f64>,
        /// Bindings as (tag, element, scope, property).
        bindings: Vec<(usize, u32, BindScope, String)>,
        /// Pushes as (tag, value).
        pushes: Vec<(usize, f64)>,
        /// Refuse the next bind call.
        refuse_bind: bool,
    }

    impl RecordingModel {
        /// Model with `count` elements.
        fn with_elements(count: u32) -> Self {
            Self {
                elements: (1..=count).collect(),
                ..Self::default()
            }
        }
    }

    impl ParameterModel for RecordingModel {
        type Element = u32;
        type Error = RecordingError;

        fn declare_parameter(&mut self) -> Result<ParameterHandle, Self::Error> {
            self.values.push(0.0);
            Ok(ParameterHandle::new(self.values.len()))
        }

        fn bind_parameter(
            &mut self,
            handle: ParameterHandle,
            element: u32,
            scope: BindScope,
            property: &str,
        ) -> Result<(), Self::Error> {
            if self.refuse_bind {
                return Err(RecordingError::Refused("bind"));
            }
            self.bindings
                .push((handle.tag(), element, scope, property.to_owned()));
            Ok(())
        }

        fn set_parameter_value(
            &mut self,
            handle: ParameterHandle,
            value: f64,
        ) -> Result<(), Self::Error> {
            let slot = self
                .values
                .get_mut(handle.tag().wrapping_sub(1))
                .ok_or(RecordingError::Unknown(handle.tag()))?;
            *slot = value;
            self.pushes.push((handle.tag(), value));
            Ok(())
        }

        fn parameter_value(&self, handle: ParameterHandle) -> Result<f64, Self::Error> {
            self.values
                .get(handle.tag().wrapping_sub(1))
                .copied()
                .ok_or(RecordingError::Unknown(handle.tag()))
        }

        fn element_ids(&self) -> Vec<u32> {
            self.elements.clone()
        }

        fn run_analysis_step(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn steel() -> PropertySet {
        PropertySet::from_iter([("Fy", 250.0), ("E", 210_000.0)])
    }

    #[test]
    fn initialize_binds_every_key_to_every_element() {
        let mut model = RecordingModel::with_elements(3);
        let controller = DegradationController::new("EC3")
            .initialize(&mut model, 20.0, steel())
            .expect("binds");

        assert_eq!(model.bindings.len(), 12);
        for element in 1..=3 {
            for key in TrackedKey::ALL {
                let handle = controller.binding().handle(key).tag();
                assert!(model.bindings.contains(&(
                    handle,
                    element,
                    BindScope::AllSections,
                    key.property_name().to_owned()
                )));
            }
        }
    }

    #[test]
    fn initialize_pushes_only_ambient_strength_and_modulus() {
        let mut model = RecordingModel::with_elements(1);
        let controller = DegradationController::new("EC3")
            .initialize(&mut model, 20.0, steel())
            .expect("binds");
        let binding = controller.binding();
        assert_eq!(
            model.pushes,
            vec![
                (binding.handle(TrackedKey::YieldStrength).tag(), 250.0),
                (binding.handle(TrackedKey::ElasticModulus).tag(), 210_000.0),
            ]
        );
    }

    #[test]
    fn update_pushes_degraded_values_and_aliased_strain() {
        let mut model = RecordingModel::with_elements(2);
        let controller = DegradationController::new("EC3")
            .initialize(&mut model, 20.0, steel())
            .expect("binds");
        controller.update(&mut model, 500.0).expect("in range");

        let values = controller.current_values(&model).expect("readable");
        assert_relative_eq!(values.get("Fy").expect("Fy"), 195.0, epsilon = 1.0e-9);
        assert_relative_eq!(values.get("E").expect("E"), 126_000.0, epsilon = 1.0e-6);
        let strain = values.get(INITIAL_STRAIN_KEY).expect("strain");
        assert_relative_eq!(strain, -6.7584e-5, epsilon = 1.0e-15);
        assert_eq!(values.get(ALIASED_INITIAL_STRAIN_KEY), Some(strain));
    }

    #[test]
    fn updates_start_from_the_reference_state() {
        let mut model = RecordingModel::with_elements(1);
        let controller = DegradationController::new("EC3")
            .initialize(&mut model, 20.0, steel())
            .expect("binds");

        controller.update(&mut model, 650.0).expect("in range");
        let first = controller.current_values(&model).expect("readable");
        controller.update(&mut model, 650.0).expect("in range");
        assert_eq!(controller.current_values(&model).expect("readable"), first);

        controller.update(&mut model, 900.0).expect("in range");
        controller.update(&mut model, 300.0).expect("in range");
        controller.update(&mut model, 650.0).expect("in range");
        assert_eq!(controller.current_values(&model).expect("readable"), first);
        assert_eq!(controller.reference(), &steel());
    }

    #[test]
    fn rejected_temperature_pushes_nothing() {
        let mut model = RecordingModel::with_elements(1);
        let controller = DegradationController::new("EC3")
            .initialize(&mut model, 20.0, steel())
            .expect("binds");
        let pushed_before = model.pushes.len();

        let error = controller
            .update(&mut model, 1_250.0)
            .expect_err("above ceiling");
        assert!(matches!(
            error,
            ControllerError::Thermal(ThermalError::TemperatureOutOfRange { .. })
        ));
        assert_eq!(model.pushes.len(), pushed_before);
    }

    #[test]
    fn unknown_model_fails_before_declaring_parameters() {
        let mut model = RecordingModel::with_elements(1);
        let error = DegradationController::new("EC9")
            .initialize(&mut model, 20.0, steel())
            .expect_err("unknown model");
        assert!(matches!(
            error,
            ControllerError::Thermal(ThermalError::UnknownModel { .. })
        ));
        assert!(model.values.is_empty());
    }

    #[test]
    fn reference_must_define_strength_and_modulus() {
        let mut model = RecordingModel::with_elements(1);
        let error = DegradationController::new("EC3")
            .initialize(&mut model, 20.0, PropertySet::from_iter([("Fy", 250.0)]))
            .expect_err("E missing");
        assert_eq!(
            error,
            ControllerError::MissingReferenceProperty("E".to_owned())
        );
    }

    #[test]
    fn model_errors_pass_through_unchanged() {
        let mut model = RecordingModel::with_elements(1);
        model.refuse_bind = true;
        let error = DegradationController::new("EC3")
            .initialize(&mut model, 20.0, steel())
            .expect_err("bind refused");
        assert_eq!(error, ControllerError::Model(RecordingError::Refused("bind")));
    }

    #[test]
    fn custom_reference_temperature_offsets_updates() {
        let mut model = RecordingModel::with_elements(1);
        let controller = DegradationController::new("EC3")
            .initialize(&mut model, 100.0, steel())
            .expect("binds");
        let properties = controller.update(&mut model, 580.0).expect("in range");
        assert_relative_eq!(properties.get("Fy").expect("Fy"), 195.0, epsilon = 1.0e-9);

        let error = controller.update(&mut model, 90.0).expect_err("below reference");
        assert!(matches!(
            error,
            ControllerError::Thermal(ThermalError::TemperatureOutOfRange { .. })
        ));
    }
}
