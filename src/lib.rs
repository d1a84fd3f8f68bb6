#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod controller;
mod elongation;
mod errors;
mod geometry;
mod parameters;
mod properties;
mod reduction;
mod registry;
mod truss;

pub use controller::{
    BoundController, DegradationController, ParameterBinding, TrackedKey,
    ALIASED_INITIAL_STRAIN_KEY,
};
pub use elongation::{thermal_elongation, ELONGATION_CEILING};
pub use errors::{
    AnalysisError, ControllerError, MemberPropertyError, ParameterError, RegistryError,
    ThermalError, TrussEditError, TrussModelError,
};
pub use geometry::{displacement, force, point, Displacement, Force, Point};
pub use parameters::{BindScope, ParameterHandle, ParameterModel};
pub use properties::{
    thermal_update, PropertySet, DEFAULT_REFERENCE_TEMPERATURE, INITIAL_STRAIN_KEY,
};
pub use reduction::{
    Property, ReductionTable, BREAKPOINT_COUNT, BREAKPOINT_SPACING, FIRST_BREAKPOINT_OFFSET,
};
pub use registry::{MaterialModel, ModelRegistry};
pub use truss::Truss;
