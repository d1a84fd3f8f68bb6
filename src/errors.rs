//! Error types produced while degrading properties, binding parameters or
//! analysing trusses.

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

use crate::parameters::ParameterHandle;

/// Error returned when a temperature-dependent property update is rejected.
///
/// Every variant is raised before any value is computed, so a failed update
/// never yields a partial property set.
///
/// # Examples
///
/// ```
/// use thermx::{thermal_update, PropertySet, ThermalError};
///
/// let reference = PropertySet::from_iter([("Fy", 250.0)]);
/// let error = thermal_update(100.0, &reference, "EC9", 20.0).expect_err("no such model");
/// assert!(matches!(error, ThermalError::UnknownModel { .. }));
/// ```
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ThermalError {
    /// Returned when the requested material model is not registered.
    #[error("unknown model '{model}'; available: {}", .available.join(", "))]
    UnknownModel {
        /// Name that was requested.
        model: String,
        /// Names registered at the time of the lookup.
        available: Vec<String>,
    },
    /// Returned when a temperature-sensitive property has no table in the model.
    #[error("reduction factors for {} not available in model '{model}'", .properties.join(", "))]
    MissingReductionFactors {
        /// Model that was consulted.
        model: String,
        /// Keys of the properties without a table.
        properties: Vec<String>,
    },
    /// Returned when the absolute temperature lies outside the reference to 1200 °C range.
    #[error("temperature {temperature} °C must lie within {reference}–1200 °C")]
    TemperatureOutOfRange {
        /// Absolute temperature that was requested.
        temperature: f64,
        /// Reference temperature of the property set.
        reference: f64,
    },
    /// Returned when the elongation model is evaluated above its ceiling.
    #[error("temperature {temperature} °C is above the 1200 °C elongation model limit")]
    ElongationDomain {
        /// Absolute temperature that was requested.
        temperature: f64,
    },
}

/// Error returned when reduction-factor data fails validation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Returned when a table does not hold exactly twelve factors.
    #[error("reduction table must hold 12 factors (received {found})")]
    TableLength {
        /// Number of factors supplied.
        found: usize,
    },
    /// Returned when a factor is not a finite number between zero and one.
    #[error("reduction factor {value} at breakpoint {index} is outside [0, 1]")]
    InvalidFactor {
        /// Position of the offending entry.
        index: usize,
        /// Rejected factor.
        value: f64,
    },
    /// Returned when a table is keyed by something other than `Fy`, `Fp` or `E`.
    #[error("'{0}' is not a temperature-sensitive property")]
    UnknownProperty(String),
    /// Returned when registry data cannot be parsed.
    #[error("invalid registry data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error returned by a [`BoundController`](crate::BoundController) or while
/// creating one.
///
/// `E` is the error type of the external model; failures it reports are passed
/// through untouched in [`ControllerError::Model`].
#[derive(Debug, Error, PartialEq)]
pub enum ControllerError<E> {
    /// Returned when the degradation model rejects the request.
    #[error(transparent)]
    Thermal(#[from] ThermalError),
    /// Returned when the reference set lacks a value the controller must push.
    #[error("reference properties must define '{0}'")]
    MissingReferenceProperty(String),
    /// Returned when the external model fails to declare, bind or set a parameter.
    #[error("external model error: {0}")]
    Model(#[source] E),
}

/// Error returned by the truss when a parameter handle is misused.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParameterError {
    /// Returned when a handle was not declared on this truss.
    #[error("parameter {0:?} has not been declared")]
    UnknownParameter(ParameterHandle),
    /// Returned when a member has no property with the requested name.
    #[error("members have no parameterisable property '{0}'")]
    UnknownProperty(String),
    /// Returned when binding targets a member that is not part of the truss.
    #[error("member {0:?} does not exist in this truss")]
    UnknownMember(EdgeIndex),
    /// Returned when a handle is pushed a value that no bound member accepts.
    #[error("parameter {handle:?} rejected value {value} for '{property}'")]
    RejectedValue {
        /// Handle being updated.
        handle: ParameterHandle,
        /// Property the handle is bound to.
        property: String,
        /// Value that was refused.
        value: f64,
    },
}

/// Error reported by the truss through the parameter boundary.
#[derive(Debug, Error, PartialEq)]
pub enum TrussModelError {
    /// Returned when a parameter cannot be declared, bound or set.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    /// Returned when an analysis step fails.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Error returned when a truss analysis fails.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Returned when a member is missing required material properties.
    #[error("member {0:?} is missing material properties")]
    MissingProperties(EdgeIndex),
    /// Returned when a member spans zero distance.
    #[error("member {0:?} has zero length")]
    ZeroLengthMember(EdgeIndex),
    /// Returned when the supplied properties for a member are not physically meaningful.
    #[error("member {member:?} has invalid properties: {source}")]
    InvalidMemberProperties {
        /// Identifier of the offending member.
        member: EdgeIndex,
        /// Description of the invalid property.
        #[source]
        source: MemberPropertyError,
    },
    /// Returned when the stiffness matrix cannot be inverted.
    #[error("stiffness matrix is singular; check supports and connectivity")]
    SingularStiffness,
}

/// Error returned when updating material properties for a truss member.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum MemberPropertyError {
    /// Returned when the cross-sectional area is zero or negative.
    #[error("area must be positive (received {area})")]
    NonPositiveArea {
        /// Identifier of the affected member.
        member: EdgeIndex,
        /// Rejected cross-sectional area.
        area: f64,
    },
    /// Returned when the elastic modulus is zero or negative.
    #[error("elastic modulus must be positive (received {elastic_modulus})")]
    NonPositiveElasticModulus {
        /// Identifier of the affected member.
        member: EdgeIndex,
        /// Rejected elastic modulus.
        elastic_modulus: f64,
    },
}

/// Error returned when editing a [`Truss`](crate::Truss) with invalid indices.
///
/// Attempting to mutate the structure with a joint or member that is not part of the
/// current graph returns a descriptive variant so callers can decide how to recover.
///
/// # Examples
///
/// ```
/// use petgraph::graph::EdgeIndex;
/// use thermx::{Truss, TrussEditError};
///
/// let mut truss = Truss::new();
/// let invalid_member = EdgeIndex::new(42);
/// let error = truss
///     .set_member_properties(invalid_member, 0.01, 200.0e9)
///     .expect_err("unknown member is rejected");
/// assert_eq!(error, TrussEditError::UnknownMember(invalid_member));
/// ```
#[derive(Debug, Error, PartialEq)]
pub enum TrussEditError {
    /// Returned when a joint cannot be found in the truss.
    #[error("joint {0:?} does not exist in this truss")]
    UnknownJoint(NodeIndex),
    /// Returned when a member cannot be found in the truss.
    #[error("member {0:?} does not exist in this truss")]
    UnknownMember(EdgeIndex),
    /// Returned when the supplied member properties are invalid.
    #[error("{0}")]
    InvalidMemberProperties(MemberPropertyError),
}
