use crate::conditions::{BarProperties, RestrainedBar};
use std::error::Error;
use thermx::{DegradationController, ParameterModel, PropertySet, Truss};

/// Result of heating the restrained bar for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatedSummary {
    /// Steel temperature in °C.
    pub temperature: f64,
    /// Degraded properties pushed into the truss.
    pub properties: PropertySet,
    /// Axial force in the bar.
    pub axial_force: f64,
    /// Axial stress in the bar.
    pub axial_stress: f64,
    /// Factor of safety against the degraded yield strength.
    pub factor_of_safety: Option<f64>,
}

/// Bind a controller to the bar, heat it to `temperature` and solve one step.
pub fn run_heated_step(
    truss: &mut Truss,
    bar: &RestrainedBar,
    properties: &BarProperties,
    temperature: f64,
) -> Result<HeatedSummary, Box<dyn Error>> {
    let controller = DegradationController::new(properties.model).initialize(
        truss,
        thermx::DEFAULT_REFERENCE_TEMPERATURE,
        properties.reference(),
    )?;
    let degraded = controller.update(truss, temperature)?;
    truss.run_analysis_step()?;

    Ok(HeatedSummary {
        temperature,
        properties: degraded,
        axial_force: truss.member_axial_force(bar.member).unwrap_or_default(),
        axial_stress: truss.member_stress(bar.member).unwrap_or_default(),
        factor_of_safety: truss.member_factor_of_safety(bar.member),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::build_restrained_bar;

    #[test]
    fn heating_compresses_the_restrained_bar() {
        let properties = BarProperties::default();
        let (mut truss, bar) = build_restrained_bar(&properties).expect("bar builds");
        let summary =
            run_heated_step(&mut truss, &bar, &properties, 500.0).expect("step solves");

        // Fully restrained: stress = E(T) * initial_strain = 126000 * -6.7584e-5.
        let expected_stress = 126_000.0 * -6.7584e-5;
        assert!((summary.axial_stress - expected_stress).abs() < 1.0e-9);
        assert!((summary.axial_force - expected_stress * properties.area).abs() < 1.0e-6);

        let fos = summary.factor_of_safety.expect("Fy is bound");
        assert!((fos - 195.0 / expected_stress.abs()).abs() < 1.0e-6);
    }

    #[test]
    fn temperatures_beyond_the_tables_are_rejected() {
        let properties = BarProperties::default();
        let (mut truss, bar) = build_restrained_bar(&properties).expect("bar builds");
        assert!(run_heated_step(&mut truss, &bar, &properties, 1_300.0).is_err());
    }
}
