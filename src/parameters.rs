//! The parameter surface a structural model exposes to the degradation
//! controller.
//!
//! A model hands out [`ParameterHandle`]s, lets them be bound to named
//! properties of its elements, and accepts new values through them. The
//! controller never sees the model's own element or material objects.

use std::fmt;

/// Opaque identifier of a parameter declared on an external model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterHandle(usize);

impl ParameterHandle {
    /// Wrap a model-specific tag.
    #[must_use]
    pub const fn new(tag: usize) -> Self {
        Self(tag)
    }

    /// The model-specific tag this handle wraps.
    #[must_use]
    pub const fn tag(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParameterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter {}", self.0)
    }
}

/// Part of an element a parameter is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindScope {
    /// Every section of the element.
    AllSections,
}

impl BindScope {
    /// Name of the scope as structural solvers usually spell it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BindScope::AllSections => "allSections",
        }
    }
}

/// A structural model whose element properties can be driven by parameters.
///
/// Implementations are free to block; every call is treated as a side effect
/// on the model and failures are reported through [`ParameterModel::Error`].
pub trait ParameterModel {
    /// Identifier of an element in the model.
    type Element: Copy + fmt::Debug;
    /// Error reported by the model.
    type Error: std::error::Error + 'static;

    /// Declare a new parameter and return its handle.
    ///
    /// # Errors
    ///
    /// Returns the model's error if it cannot create another parameter.
    fn declare_parameter(&mut self) -> Result<ParameterHandle, Self::Error>;

    /// Attach `handle` to `property` of `element` within `scope`.
    ///
    /// # Errors
    ///
    /// Returns the model's error for unknown handles, elements or properties.
    fn bind_parameter(
        &mut self,
        handle: ParameterHandle,
        element: Self::Element,
        scope: BindScope,
        property: &str,
    ) -> Result<(), Self::Error>;

    /// Push `value` into every property bound to `handle`.
    ///
    /// # Errors
    ///
    /// Returns the model's error for unknown handles or values it refuses.
    fn set_parameter_value(&mut self, handle: ParameterHandle, value: f64)
        -> Result<(), Self::Error>;

    /// The value most recently pushed through `handle`.
    ///
    /// # Errors
    ///
    /// Returns the model's error for unknown handles.
    fn parameter_value(&self, handle: ParameterHandle) -> Result<f64, Self::Error>;

    /// Every element in the model.
    fn element_ids(&self) -> Vec<Self::Element>;

    /// Advance the analysis by one step.
    ///
    /// # Errors
    ///
    /// Returns the model's error when the step fails to converge or solve.
    fn run_analysis_step(&mut self) -> Result<(), Self::Error>;
}
