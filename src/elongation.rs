//! Free thermal elongation of carbon steel.

use crate::errors::ThermalError;

/// Highest absolute temperature, in °C, covered by the elongation model.
pub const ELONGATION_CEILING: f64 = 1200.0;

/// Free thermal elongation strain of carbon steel at `temperature` °C.
///
/// The curve is quadratic up to 750 °C, flat through the phase change up to
/// 860 °C and linear beyond. The branches are taken exactly as published, so
/// the small step into the plateau at 750 °C is part of the curve.
///
/// # Errors
///
/// Returns [`ThermalError::ElongationDomain`] above 1200 °C.
///
/// # Examples
/// ```
/// use thermx::thermal_elongation;
///
/// assert_eq!(thermal_elongation(20.0).expect("in range"), 0.0);
/// assert_eq!(thermal_elongation(800.0).expect("in range"), 0.011);
/// assert!(thermal_elongation(1200.5).is_err());
/// ```
pub fn thermal_elongation(temperature: f64) -> Result<f64, ThermalError> {
    if temperature <= 20.0 {
        Ok(0.0)
    } else if temperature <= 750.0 {
        Ok(-2.416e-4 + 1.2e-5 * temperature + 0.4e-8 * temperature * temperature)
    } else if temperature <= 860.0 {
        Ok(0.011)
    } else if temperature <= ELONGATION_CEILING {
        Ok(-6.2e-3 + 2e-5 * temperature)
    } else {
        Err(ThermalError::ElongationDomain { temperature })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn no_elongation_at_or_below_ambient() {
        for temperature in [-40.0, 0.0, 20.0] {
            assert_eq!(thermal_elongation(temperature), Ok(0.0));
        }
    }

    #[test]
    fn quadratic_branch_matches_closed_form() {
        let elongation = thermal_elongation(100.0).expect("in range");
        assert_relative_eq!(elongation, 9.984e-4, epsilon = 1.0e-12);

        let elongation = thermal_elongation(500.0).expect("in range");
        assert_relative_eq!(elongation, 6.7584e-3, epsilon = 1.0e-12);
    }

    #[test]
    fn plateau_covers_phase_change() {
        for temperature in [750.5, 800.0, 860.0] {
            assert_eq!(thermal_elongation(temperature), Ok(0.011));
        }
    }

    #[test]
    fn step_into_plateau_is_kept() {
        let below = thermal_elongation(750.0).expect("in range");
        let above = thermal_elongation(750.0 + 1.0e-9).expect("in range");
        assert_relative_eq!(below, 0.0110084, epsilon = 1.0e-12);
        assert_eq!(above, 0.011);
        assert!((below - above) > 8.0e-6);
    }

    #[test]
    fn linear_branch_starts_from_plateau() {
        let below = thermal_elongation(860.0).expect("in range");
        let above = thermal_elongation(860.0 + 1.0e-6).expect("in range");
        assert_eq!(below, 0.011);
        assert_relative_eq!(above, 0.011, epsilon = 1.0e-9);
    }

    #[test]
    fn ceiling_is_inclusive() {
        let elongation = thermal_elongation(ELONGATION_CEILING).expect("ceiling is in range");
        assert_relative_eq!(elongation, 0.0178, epsilon = 1.0e-12);

        assert_eq!(
            thermal_elongation(1200.001),
            Err(ThermalError::ElongationDomain {
                temperature: 1200.001
            })
        );
    }
}
