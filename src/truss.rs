//! Linear pin-jointed truss whose member properties can be driven by
//! parameters.

use std::collections::HashMap;

use log::trace;
use nalgebra::{DMatrix, DVector, SMatrix, Vector3};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};

use crate::controller::ALIASED_INITIAL_STRAIN_KEY;
use crate::errors::{
    AnalysisError, MemberPropertyError, ParameterError, TrussEditError, TrussModelError,
};
use crate::geometry::{Displacement, Force, Point};
use crate::parameters::{BindScope, ParameterHandle, ParameterModel};
use crate::properties::INITIAL_STRAIN_KEY;
use crate::reduction::Property;

/// Internal representation of a truss joint.
#[derive(Clone, Debug)]
struct Joint {
    /// Position of the joint.
    position: Point,
    /// Indicator for each translational degree of freedom that is restrained.
    support: [bool; 3],
    /// External load applied to the joint.
    load: Force,
    /// Solved displacement of the joint.
    displacement: Displacement,
}

impl Joint {
    /// Create a free, unloaded joint at `position`.
    fn new(position: Point) -> Self {
        Self {
            position,
            support: [false; 3],
            load: Force::default(),
            displacement: Displacement::default(),
        }
    }
}

/// Internal representation of a truss member.
#[derive(Clone, Debug, Default)]
struct Member {
    /// Cross-sectional area.
    area: Option<f64>,
    /// Elastic modulus.
    elastic_modulus: Option<f64>,
    /// Optional yield strength.
    yield_strength: Option<f64>,
    /// Axial strain imposed without stress, added to the elastic strain.
    initial_strain: f64,
    /// Axial force after analysis, positive in tension.
    axial_force: f64,
    /// Axial stress after analysis.
    stress: f64,
    /// Factor of safety against yielding after analysis.
    factor_of_safety: Option<f64>,
}

/// Member quantity a parameter can be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MemberProperty {
    /// `"Fy"`.
    YieldStrength,
    /// `"E"`.
    ElasticModulus,
    /// `"initial_strain"` or its axial alias `"eps0_11"`.
    InitialStrain,
}

impl MemberProperty {
    /// Resolve a bound property name.
    fn parse(name: &str) -> Option<Self> {
        match name {
            name if name == Property::YieldStrength.key() => Some(Self::YieldStrength),
            name if name == Property::ElasticModulus.key() => Some(Self::ElasticModulus),
            INITIAL_STRAIN_KEY | ALIASED_INITIAL_STRAIN_KEY => Some(Self::InitialStrain),
            _ => None,
        }
    }

    /// Whether a member accepts `value` for this property.
    fn accepts(self, value: f64) -> bool {
        match self {
            Self::YieldStrength | Self::ElasticModulus => value.is_finite() && value >= 0.0,
            Self::InitialStrain => value.is_finite(),
        }
    }

    /// Write `value` into `member`.
    fn apply(self, member: &mut Member, value: f64) {
        match self {
            Self::YieldStrength => member.yield_strength = Some(value),
            Self::ElasticModulus => member.elastic_modulus = Some(value),
            Self::InitialStrain => member.initial_strain = value,
        }
    }
}

/// A declared parameter and the member properties it drives.
#[derive(Clone, Debug, Default)]
struct Parameter {
    /// Last value pushed through the parameter.
    value: f64,
    /// Member properties the parameter writes to.
    targets: Vec<(EdgeIndex, MemberProperty, String)>,
}

/// Container for a pin-jointed truss model.
#[derive(Debug, Default)]
pub struct Truss {
    /// Underlying graph storage for joints and members.
    graph: Graph<Joint, Member>,
    /// Declared parameters, indexed by handle tag.
    parameters: Vec<Parameter>,
    /// Indicates whether the cached analysis results are current.
    analysis_valid: bool,
}

impl Truss {
    /// Create an empty truss.
    ///
    /// # Examples
    /// ```
    /// use thermx::Truss;
    ///
    /// let truss = Truss::new();
    /// assert_eq!(truss.joint_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of joints in the truss.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of members in the truss.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add a new joint to the truss.
    pub fn add_joint(&mut self, position: Point) -> NodeIndex {
        self.invalidate();
        self.graph.add_node(Joint::new(position))
    }

    /// Connect two joints with a new member.
    pub fn add_member(&mut self, start: NodeIndex, end: NodeIndex) -> EdgeIndex {
        self.invalidate();
        self.graph.add_edge(start, end, Member::default())
    }

    /// Set the restraint state for a joint.
    ///
    /// Each entry in `support` corresponds to the X, Y and Z directions respectively. A
    /// value of `true` indicates that the degree of freedom is fixed.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when `joint` is not part of this truss.
    pub fn set_support(
        &mut self,
        joint: NodeIndex,
        support: [bool; 3],
    ) -> Result<(), TrussEditError> {
        self.joint_mut(joint)?.support = support;
        Ok(())
    }

    /// Apply a point load to a joint.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when `joint` is not part of this truss.
    pub fn set_load(&mut self, joint: NodeIndex, load: Force) -> Result<(), TrussEditError> {
        self.joint_mut(joint)?.load = load;
        Ok(())
    }

    /// Set the area and elastic modulus of a member.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownMember`] when `member` is not part of this truss and
    /// [`TrussEditError::InvalidMemberProperties`] when either `area` or `elastic_modulus`
    /// is not strictly positive.
    pub fn set_member_properties(
        &mut self,
        member: EdgeIndex,
        area: f64,
        elastic_modulus: f64,
    ) -> Result<(), TrussEditError> {
        if self.graph.edge_weight(member).is_none() {
            return Err(TrussEditError::UnknownMember(member));
        }
        if area <= 0.0 {
            return Err(TrussEditError::InvalidMemberProperties(
                MemberPropertyError::NonPositiveArea { member, area },
            ));
        }
        if elastic_modulus <= 0.0 {
            return Err(TrussEditError::InvalidMemberProperties(
                MemberPropertyError::NonPositiveElasticModulus {
                    member,
                    elastic_modulus,
                },
            ));
        }
        let edge = self.member_mut(member)?;
        edge.area = Some(area);
        edge.elastic_modulus = Some(elastic_modulus);
        Ok(())
    }

    /// Assign a yield strength to a member.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownMember`] when `member` is not part of this truss.
    pub fn set_member_yield_strength(
        &mut self,
        member: EdgeIndex,
        yield_strength: f64,
    ) -> Result<(), TrussEditError> {
        self.member_mut(member)?.yield_strength = Some(yield_strength);
        Ok(())
    }

    /// Retrieve the displacement of a joint after analysis.
    #[must_use]
    pub fn joint_displacement(&self, joint: NodeIndex) -> Option<Displacement> {
        self.graph
            .node_weight(joint)
            .map(|joint| joint.displacement)
    }

    /// Retrieve the current elastic modulus of a member.
    #[must_use]
    pub fn member_elastic_modulus(&self, member: EdgeIndex) -> Option<f64> {
        self.graph
            .edge_weight(member)
            .and_then(|member| member.elastic_modulus)
    }

    /// Retrieve the current yield strength of a member.
    #[must_use]
    pub fn member_yield_strength(&self, member: EdgeIndex) -> Option<f64> {
        self.graph
            .edge_weight(member)
            .and_then(|member| member.yield_strength)
    }

    /// Retrieve the initial strain currently imposed on a member.
    #[must_use]
    pub fn member_initial_strain(&self, member: EdgeIndex) -> Option<f64> {
        self.graph
            .edge_weight(member)
            .map(|member| member.initial_strain)
    }

    /// Retrieve the axial force in a member after analysis.
    #[must_use]
    pub fn member_axial_force(&self, member: EdgeIndex) -> Option<f64> {
        self.graph
            .edge_weight(member)
            .map(|member| member.axial_force)
    }

    /// Retrieve the axial stress in a member after analysis.
    #[must_use]
    pub fn member_stress(&self, member: EdgeIndex) -> Option<f64> {
        self.graph.edge_weight(member).map(|member| member.stress)
    }

    /// Retrieve the factor of safety against yielding for a member.
    #[must_use]
    pub fn member_factor_of_safety(&self, member: EdgeIndex) -> Option<f64> {
        self.graph
            .edge_weight(member)
            .and_then(|member| member.factor_of_safety)
    }

    /// Analyse the truss under the configured loads and initial strains.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when the structure cannot be solved because of
    /// invalid member properties or insufficient constraints.
    pub fn evaluate(&mut self) -> Result<(), AnalysisError> {
        if self.analysis_valid {
            return Ok(());
        }
        let index_map = self.node_index_map();
        let stiffness = self.build_stiffness_matrix(&index_map)?;
        let load = self.build_load_vector(&index_map);
        let free_dofs = self.collect_free_dofs(&index_map);
        let displacements = Self::solve_displacements(&stiffness, &load, &free_dofs)?;
        self.store_joint_displacements(&index_map, &displacements);
        self.update_member_forces(&index_map, &displacements);
        trace!(
            "solved {} free degrees of freedom over {} members",
            free_dofs.len(),
            self.member_count()
        );
        self.analysis_valid = true;
        Ok(())
    }

    /// Mutable access to a joint, invalidating cached results.
    fn joint_mut(&mut self, joint: NodeIndex) -> Result<&mut Joint, TrussEditError> {
        if self.graph.node_weight(joint).is_none() {
            return Err(TrussEditError::UnknownJoint(joint));
        }
        self.invalidate();
        self.graph
            .node_weight_mut(joint)
            .ok_or(TrussEditError::UnknownJoint(joint))
    }

    /// Mutable access to a member, invalidating cached results.
    fn member_mut(&mut self, member: EdgeIndex) -> Result<&mut Member, TrussEditError> {
        if self.graph.edge_weight(member).is_none() {
            return Err(TrussEditError::UnknownMember(member));
        }
        self.invalidate();
        self.graph
            .edge_weight_mut(member)
            .ok_or(TrussEditError::UnknownMember(member))
    }

    /// Parameter declared under `handle`.
    fn parameter(&self, handle: ParameterHandle) -> Result<&Parameter, ParameterError> {
        self.parameters
            .get(handle.tag())
            .ok_or(ParameterError::UnknownParameter(handle))
    }

    /// Reset cached analysis results when the topology or properties change.
    fn invalidate(&mut self) {
        if self.analysis_valid {
            for joint in self.graph.node_weights_mut() {
                joint.displacement = Displacement::default();
            }
            for member in self.graph.edge_weights_mut() {
                member.axial_force = 0.0;
                member.stress = 0.0;
                member.factor_of_safety = None;
            }
            self.analysis_valid = false;
        }
    }

    /// Construct a mapping from graph indices to contiguous degree-of-freedom indices.
    fn node_index_map(&self) -> HashMap<NodeIndex, usize> {
        self.graph
            .node_indices()
            .enumerate()
            .map(|(idx, node)| (node, idx))
            .collect()
    }

    /// Unit vector and length of a member, start joint to end joint.
    fn member_axis(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex, Vector3<f64>, f64)> {
        let (start, end) = self.graph.edge_endpoints(edge)?;
        let delta = self.graph[end].position.to_vector() - self.graph[start].position.to_vector();
        let length = delta.norm();
        Some((start, end, delta / length, length))
    }

    /// Assemble the global stiffness matrix for the current configuration.
    fn build_stiffness_matrix(
        &self,
        index_map: &HashMap<NodeIndex, usize>,
    ) -> Result<DMatrix<f64>, AnalysisError> {
        let dof = self.joint_count() * 3;
        let mut matrix = DMatrix::zeros(dof, dof);
        for edge in self.graph.edge_indices() {
            let (area, elastic_modulus) = match &self.graph[edge] {
                Member {
                    area: Some(area),
                    elastic_modulus: Some(elastic_modulus),
                    ..
                } => (*area, *elastic_modulus),
                _ => return Err(AnalysisError::MissingProperties(edge)),
            };
            if area <= 0.0 {
                return Err(AnalysisError::InvalidMemberProperties {
                    member: edge,
                    source: MemberPropertyError::NonPositiveArea { member: edge, area },
                });
            }
            if elastic_modulus <= 0.0 {
                return Err(AnalysisError::InvalidMemberProperties {
                    member: edge,
                    source: MemberPropertyError::NonPositiveElasticModulus {
                        member: edge,
                        elastic_modulus,
                    },
                });
            }
            let Some((start, end, direction, length)) = self.member_axis(edge) else {
                continue;
            };
            if length == 0.0 {
                return Err(AnalysisError::ZeroLengthMember(edge));
            }

            // k = EA/L [[dd^T, -dd^T], [-dd^T, dd^T]]
            let outer = direction * direction.transpose() * (elastic_modulus * area / length);
            let mut local = SMatrix::<f64, 6, 6>::zeros();
            local.fixed_view_mut::<3, 3>(0, 0).copy_from(&outer);
            local.fixed_view_mut::<3, 3>(3, 3).copy_from(&outer);
            local.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-outer));
            local.fixed_view_mut::<3, 3>(3, 0).copy_from(&(-outer));

            let start_idx = index_map[&start] * 3;
            let end_idx = index_map[&end] * 3;
            let dof_map = [
                start_idx,
                start_idx + 1,
                start_idx + 2,
                end_idx,
                end_idx + 1,
                end_idx + 2,
            ];

            for (row_local, global_row) in dof_map.iter().enumerate() {
                for (col_local, global_col) in dof_map.iter().enumerate() {
                    matrix[(*global_row, *global_col)] += local[(row_local, col_local)];
                }
            }
        }
        Ok(matrix)
    }

    /// Assemble the global nodal load vector, including the equivalent loads
    /// of member initial strains.
    fn build_load_vector(&self, index_map: &HashMap<NodeIndex, usize>) -> DVector<f64> {
        let dof = self.joint_count() * 3;
        let mut load = DVector::zeros(dof);
        for node in self.graph.node_indices() {
            let base = index_map[&node] * 3;
            load.fixed_rows_mut::<3>(base)
                .copy_from(&self.graph[node].load.to_vector());
        }
        for edge in self.graph.edge_indices() {
            let member = &self.graph[edge];
            let (Some(area), Some(elastic_modulus)) = (member.area, member.elastic_modulus) else {
                continue;
            };
            if member.initial_strain == 0.0 {
                continue;
            }
            let Some((start, end, direction, _)) = self.member_axis(edge) else {
                continue;
            };
            // A restrained member would carry EA * eps0; release it as joint loads.
            let locked = direction * (elastic_modulus * area * member.initial_strain);
            let start_base = index_map[&start] * 3;
            let end_base = index_map[&end] * 3;
            let mut start_load = load.fixed_rows_mut::<3>(start_base);
            start_load += locked;
            let mut end_load = load.fixed_rows_mut::<3>(end_base);
            end_load -= locked;
        }
        load
    }

    /// Determine the indices corresponding to unconstrained degrees of freedom.
    fn collect_free_dofs(&self, index_map: &HashMap<NodeIndex, usize>) -> Vec<usize> {
        let mut free = Vec::new();
        for node in self.graph.node_indices() {
            let joint = &self.graph[node];
            let base = index_map[&node] * 3;
            for axis in 0..3 {
                if !joint.support[axis] {
                    free.push(base + axis);
                }
            }
        }
        free
    }

    /// Solve for joint displacements using the reduced stiffness matrix.
    fn solve_displacements(
        stiffness: &DMatrix<f64>,
        load: &DVector<f64>,
        free_dofs: &[usize],
    ) -> Result<DVector<f64>, AnalysisError> {
        let mut displacements = DVector::zeros(load.len());
        if free_dofs.is_empty() {
            return Ok(displacements);
        }
        let k_ff = stiffness.select_rows(free_dofs).select_columns(free_dofs);
        let f_f = load.select_rows(free_dofs);
        let solution = k_ff
            .lu()
            .solve(&f_f)
            .ok_or(AnalysisError::SingularStiffness)?;
        for (idx, &dof) in free_dofs.iter().enumerate() {
            displacements[dof] = solution[idx];
        }
        Ok(displacements)
    }

    /// Persist solved joint displacements back to the graph representation.
    fn store_joint_displacements(
        &mut self,
        index_map: &HashMap<NodeIndex, usize>,
        displacements: &DVector<f64>,
    ) {
        for node in self.graph.node_indices() {
            let base = index_map[&node] * 3;
            let solved = displacements.fixed_rows::<3>(base).into_owned();
            self.graph[node].displacement = Displacement::from(solved);
        }
    }

    /// Compute member axial forces, stresses and factors of safety.
    fn update_member_forces(
        &mut self,
        index_map: &HashMap<NodeIndex, usize>,
        displacements: &DVector<f64>,
    ) {
        for edge in self.graph.edge_indices() {
            let Some((start, end, direction, length)) = self.member_axis(edge) else {
                continue;
            };
            let member = &mut self.graph[edge];
            let (Some(area), Some(elastic_modulus)) = (member.area, member.elastic_modulus) else {
                member.axial_force = 0.0;
                member.stress = 0.0;
                member.factor_of_safety = None;
                continue;
            };
            let start_disp = displacements.fixed_rows::<3>(index_map[&start] * 3);
            let end_disp = displacements.fixed_rows::<3>(index_map[&end] * 3);
            let elongation = direction.dot(&(end_disp - start_disp)) / length;
            let axial_force = elastic_modulus * area * (elongation + member.initial_strain);
            let stress = axial_force / area;

            member.axial_force = axial_force;
            member.stress = stress;
            member.factor_of_safety = member.yield_strength.map(|yield_strength| {
                if stress == 0.0 {
                    f64::INFINITY
                } else {
                    yield_strength / stress.abs()
                }
            });
        }
    }
}

impl ParameterModel for Truss {
    type Element = EdgeIndex;
    type Error = TrussModelError;

    fn declare_parameter(&mut self) -> Result<ParameterHandle, Self::Error> {
        self.parameters.push(Parameter::default());
        Ok(ParameterHandle::new(self.parameters.len() - 1))
    }

    /// Bind `handle` to a member property.
    ///
    /// Members accept `"Fy"`, `"E"` and the initial strain under either
    /// `"initial_strain"` or `"eps0_11"`; a truss member has a single section,
    /// so [`BindScope::AllSections`] addresses the whole member.
    fn bind_parameter(
        &mut self,
        handle: ParameterHandle,
        element: EdgeIndex,
        scope: BindScope,
        property: &str,
    ) -> Result<(), Self::Error> {
        let BindScope::AllSections = scope;
        self.parameter(handle)?;
        if self.graph.edge_weight(element).is_none() {
            return Err(ParameterError::UnknownMember(element).into());
        }
        let target = MemberProperty::parse(property)
            .ok_or_else(|| ParameterError::UnknownProperty(property.to_owned()))?;
        self.parameters[handle.tag()]
            .targets
            .push((element, target, property.to_owned()));
        Ok(())
    }

    fn set_parameter_value(
        &mut self,
        handle: ParameterHandle,
        value: f64,
    ) -> Result<(), Self::Error> {
        let parameter = self.parameter(handle)?;
        if let Some((_, _, property)) = parameter
            .targets
            .iter()
            .find(|(_, target, _)| !target.accepts(value))
        {
            return Err(ParameterError::RejectedValue {
                handle,
                property: property.clone(),
                value,
            }
            .into());
        }
        let targets = parameter.targets.clone();
        self.invalidate();
        for (edge, target, _) in targets {
            if let Some(member) = self.graph.edge_weight_mut(edge) {
                target.apply(member, value);
            }
        }
        self.parameters[handle.tag()].value = value;
        Ok(())
    }

    fn parameter_value(&self, handle: ParameterHandle) -> Result<f64, Self::Error> {
        Ok(self.parameter(handle)?.value)
    }

    fn element_ids(&self) -> Vec<EdgeIndex> {
        self.graph.edge_indices().collect()
    }

    fn run_analysis_step(&mut self) -> Result<(), Self::Error> {
        Ok(self.evaluate()?)
    }
}
