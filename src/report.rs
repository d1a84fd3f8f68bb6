use crate::analysis::HeatedSummary;
use std::fmt::Write;

/// Render a textual summary of the heated bar.
#[must_use]
pub fn render_summary(summary: &HeatedSummary) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "Restrained steel bar at {:.1} °C",
        summary.temperature
    )
    .expect("writing to string cannot fail");

    for (key, value) in summary.properties.iter() {
        writeln!(&mut output, "  {key:<16} = {value:+.4e}").expect("writing to string cannot fail");
    }

    writeln!(
        &mut output,
        "Member response: axial force = {:+.1} N, stress = {:+.3} MPa",
        summary.axial_force, summary.axial_stress
    )
    .expect("writing to string cannot fail");

    match summary.factor_of_safety {
        Some(fos) if fos.is_finite() => {
            writeln!(&mut output, "Factor of safety (Fy(T) / |stress|): {fos:.2}")
                .expect("writing to string cannot fail");
        }
        Some(_) => output.push_str("Factor of safety: unbounded (member unstressed)\n"),
        None => output.push_str("Factor of safety: not available (missing yield strength)\n"),
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermx::PropertySet;

    #[test]
    fn formats_human_readable_report() {
        let summary = HeatedSummary {
            temperature: 500.0,
            properties: PropertySet::from_iter([("Fy", 195.0), ("E", 126_000.0)]),
            axial_force: -24_268.0,
            axial_stress: -8.515,
            factor_of_safety: Some(22.9),
        };
        let report = render_summary(&summary);
        assert!(report.contains("Restrained steel bar at 500.0 °C"));
        assert!(report.contains("Fy"));
        assert!(report.contains("stress = -8.515 MPa"));
        assert!(report.contains("22.90"));
    }
}
