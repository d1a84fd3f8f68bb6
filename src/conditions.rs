use thermx::{point, PropertySet, Truss, TrussEditError};

use petgraph::graph::EdgeIndex;

/// Handle to the member of the restrained bar.
#[derive(Debug, Clone, Copy)]
pub struct RestrainedBar {
    /// The bar itself.
    pub member: EdgeIndex,
}

/// Ambient properties of the demonstration bar in mm, N and MPa.
#[derive(Debug, Clone, PartialEq)]
pub struct BarProperties {
    /// Bar length.
    pub length: f64,
    /// Cross-sectional area.
    pub area: f64,
    /// Elastic modulus at 20 °C.
    pub elastic_modulus: f64,
    /// Yield strength at 20 °C.
    pub yield_strength: f64,
    /// Material model used for degradation.
    pub model: &'static str,
}

impl Default for BarProperties {
    fn default() -> Self {
        Self {
            length: 3_000.0,
            area: 2_850.0,
            elastic_modulus: 210_000.0,
            yield_strength: 250.0,
            model: "EC3",
        }
    }
}

impl BarProperties {
    /// Reference property set handed to the degradation controller.
    pub fn reference(&self) -> PropertySet {
        PropertySet::from_iter([("Fy", self.yield_strength), ("E", self.elastic_modulus)])
    }
}

/// Build a bar along the X axis with every translation fixed at both ends.
pub fn build_restrained_bar(
    properties: &BarProperties,
) -> Result<(Truss, RestrainedBar), TrussEditError> {
    let mut truss = Truss::new();
    let start = truss.add_joint(point(0.0, 0.0, 0.0));
    let end = truss.add_joint(point(properties.length, 0.0, 0.0));
    truss.set_support(start, [true, true, true])?;
    truss.set_support(end, [true, true, true])?;

    let member = truss.add_member(start, end);
    truss.set_member_properties(member, properties.area, properties.elastic_modulus)?;
    truss.set_member_yield_strength(member, properties.yield_strength)?;

    Ok((truss, RestrainedBar { member }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_single_restrained_member() {
        let properties = BarProperties::default();
        let (mut truss, bar) = build_restrained_bar(&properties).expect("bar builds");
        assert_eq!(truss.joint_count(), 2);
        assert_eq!(truss.member_count(), 1);
        assert_eq!(truss.member_yield_strength(bar.member), Some(250.0));

        // Without heating a fully restrained bar carries nothing.
        truss.evaluate().expect("analysis succeeds");
        assert_eq!(truss.member_axial_force(bar.member), Some(0.0));
    }
}
