use super::Rotation;
use crate::base::{Hypothesis, StiffnessMatrixType};
use crate::driver::CurrentState;
use crate::StrError;
use russell_lab::Matrix;

/// Defines the kind of behaviour (which driving variable and thermodynamic force it works with)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BehaviourType {
    /// Driving variables and thermodynamic forces declared by the behaviour itself
    General,

    /// Strain → stress
    SmallStrain,

    /// Deformation gradient → first Piola-Kirchhoff stress
    FiniteStrain,

    /// Opening displacement → cohesive traction
    CohesiveZone,
}

/// Defines the kinematic assumption of a behaviour
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kinematic {
    Undefined,
    SmallStrainStandard,
    CohesiveZoneKinematic,
    FiniteStrainSingleGradient,
}

/// Defines the material symmetry of a behaviour
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymmetryType {
    Isotropic,
    Orthotropic,
}

/// Defines the type of an internal state variable
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VariableType {
    Scalar,
    Stensor,
    Vector,
    Tensor,
}

impl BehaviourType {
    /// Returns the type corresponding to the code exported by behaviour libraries
    pub fn from_code(code: u16) -> Result<Self, StrError> {
        match code {
            0 => Ok(BehaviourType::General),
            1 => Ok(BehaviourType::SmallStrain),
            2 => Ok(BehaviourType::FiniteStrain),
            3 => Ok(BehaviourType::CohesiveZone),
            _ => Err("unknown behaviour type code"),
        }
    }

    /// Returns the kinematic assumption usually associated with this type
    pub fn default_kinematic(&self) -> Kinematic {
        match self {
            BehaviourType::General => Kinematic::Undefined,
            BehaviourType::SmallStrain => Kinematic::SmallStrainStandard,
            BehaviourType::FiniteStrain => Kinematic::FiniteStrainSingleGradient,
            BehaviourType::CohesiveZone => Kinematic::CohesiveZoneKinematic,
        }
    }
}

impl Kinematic {
    /// Returns the kinematic corresponding to the code exported by behaviour libraries
    pub fn from_code(code: u16) -> Result<Self, StrError> {
        match code {
            0 => Ok(Kinematic::Undefined),
            1 => Ok(Kinematic::SmallStrainStandard),
            2 => Ok(Kinematic::CohesiveZoneKinematic),
            3 => Ok(Kinematic::FiniteStrainSingleGradient),
            _ => Err("unknown behaviour kinematic code"),
        }
    }
}

impl VariableType {
    /// Returns the type corresponding to the code exported by behaviour libraries
    pub fn from_code(code: i32) -> Result<Self, StrError> {
        match code {
            0 => Ok(VariableType::Scalar),
            1 => Ok(VariableType::Stensor),
            2 => Ok(VariableType::Vector),
            3 => Ok(VariableType::Tensor),
            _ => Err("unknown internal state variable type code"),
        }
    }

    /// Returns the number of components for a given hypothesis
    pub fn size(&self, hypothesis: Hypothesis) -> usize {
        match self {
            VariableType::Scalar => 1,
            VariableType::Stensor => hypothesis.stensor_size(),
            VariableType::Vector => hypothesis.space_dimension(),
            VariableType::Tensor => hypothesis.tensor_size(),
        }
    }

    /// Returns the component suffixes for a given hypothesis
    fn components(&self, hypothesis: Hypothesis) -> Vec<&'static str> {
        match self {
            VariableType::Scalar => vec![""],
            VariableType::Stensor => hypothesis.stensor_components(),
            VariableType::Vector => ["X", "Y", "Z"][0..hypothesis.space_dimension()].to_vec(),
            VariableType::Tensor => hypothesis.tensor_components(),
        }
    }
}

/// Describes a behaviour: kind, symmetry and the names of its variables
#[derive(Clone, Debug)]
pub struct BehaviourDescription {
    /// Behaviour type
    pub btype: BehaviourType,

    /// Kinematic assumption
    pub kinematic: Kinematic,

    /// Material symmetry
    pub symmetry: SymmetryType,

    /// Modelling hypothesis
    pub hypothesis: Hypothesis,

    /// Names of the driving variable components
    pub driving_variables: Vec<String>,

    /// Names of the thermodynamic force components
    pub thermodynamic_forces: Vec<String>,

    /// Names of the material properties
    pub material_properties: Vec<String>,

    /// Names and types of the internal state variables
    pub internal_state_variables: Vec<(String, VariableType)>,

    /// Names of the external state variables (the temperature comes first)
    pub external_state_variables: Vec<String>,

    /// Indicates that the underlying implementation can be called concurrently from several runs
    pub reentrant: bool,
}

impl BehaviourDescription {
    /// Allocates a new description with the variable names derived from the type and hypothesis
    ///
    /// The lists of material properties and internal state variables are empty and
    /// the only external state variable is the temperature.
    pub fn new(btype: BehaviourType, hypothesis: Hypothesis) -> Self {
        let (driving_variables, thermodynamic_forces) = match btype {
            BehaviourType::SmallStrain => {
                let c = hypothesis.stensor_components();
                (prefixed("E", &c), prefixed("S", &c))
            }
            BehaviourType::FiniteStrain => {
                let c = hypothesis.tensor_components();
                (prefixed("F", &c), prefixed("P", &c))
            }
            BehaviourType::CohesiveZone => {
                let c = match hypothesis.space_dimension() {
                    1 => vec!["n"],
                    2 => vec!["n", "t"],
                    _ => vec!["n", "t1", "t2"],
                };
                (prefixed("U", &c), prefixed("T", &c))
            }
            BehaviourType::General => (Vec::new(), Vec::new()),
        };
        BehaviourDescription {
            btype,
            kinematic: btype.default_kinematic(),
            symmetry: SymmetryType::Isotropic,
            hypothesis,
            driving_variables,
            thermodynamic_forces,
            material_properties: Vec::new(),
            internal_state_variables: Vec::new(),
            external_state_variables: vec!["Temperature".to_string()],
            reentrant: false,
        }
    }

    /// Returns the number of driving variable components
    pub fn n_driving_variables(&self) -> usize {
        self.driving_variables.len()
    }

    /// Returns the number of thermodynamic force components
    pub fn n_thermodynamic_forces(&self) -> usize {
        self.thermodynamic_forces.len()
    }

    /// Returns the total number of internal state variable components
    pub fn n_internal_state_variables(&self) -> usize {
        self.internal_state_variables
            .iter()
            .map(|(_, t)| t.size(self.hypothesis))
            .sum()
    }

    /// Returns the names of all internal state variable components
    ///
    /// Tensorial variables are expanded with their component suffixes (e.g., `ElasticStrainXX`).
    pub fn internal_state_variable_components(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, vtype) in &self.internal_state_variables {
            for suffix in vtype.components(self.hypothesis) {
                names.push(format!("{}{}", name, suffix));
            }
        }
        names
    }

    /// Sets the default initial values of the driving variables
    ///
    /// The deformation gradient starts at the identity; everything else starts at zero.
    pub fn initial_driving_variables(&self, u: &mut [f64]) {
        for v in u.iter_mut() {
            *v = 0.0;
        }
        if self.btype == BehaviourType::FiniteStrain {
            for i in 0..3 {
                if i < u.len() {
                    u[i] = 1.0;
                }
            }
        }
    }

    /// Checks the consistency of the description
    pub fn validate(&self) -> Result<(), StrError> {
        if self.driving_variables.is_empty() {
            return Err("the behaviour declares no driving variables");
        }
        if self.driving_variables.len() != self.thermodynamic_forces.len() {
            return Err("the numbers of driving variables and thermodynamic forces must be equal");
        }
        if self.external_state_variables.first().map(|s| s.as_str()) != Some("Temperature") {
            return Err("the first external state variable must be the temperature");
        }
        Ok(())
    }
}

/// Returns the names made of a prefix and component suffixes
fn prefixed(prefix: &str, components: &[&str]) -> Vec<String> {
    components.iter().map(|c| format!("{}{}", prefix, c)).collect()
}

/// Defines the contract of a constitutive behaviour
///
/// A behaviour reads the start-of-step values and the end-of-step trial driving
/// variables from the current state and writes the end-of-step thermodynamic forces
/// and internal state variables. Operators are written in the Mandel basis of the
/// global frame; the rotation strategy resolved at setup maps values to and from the
/// material frame.
///
/// An expected local failure (e.g., non-convergence inside the behaviour or an
/// out-of-bounds variable under a strict policy) is returned as `Ok(false)`;
/// `Err(..)` is reserved for unrecoverable problems.
pub trait Behaviour {
    /// Returns the description
    fn description(&self) -> &BehaviourDescription;

    /// Computes the prediction operator at the beginning of the step
    ///
    /// The internal state is not advanced. The operator has dimensions nth × ndv.
    fn compute_prediction_operator(
        &mut self,
        kt: &mut Matrix,
        state: &CurrentState,
        rotation: &Rotation,
        ktype: StiffnessMatrixType,
    ) -> Result<bool, StrError>;

    /// Integrates the behaviour over the time increment dt
    ///
    /// Updates `state.s1` and `state.iv1` and, unless `ktype` is `NoStiffness`, writes the
    /// requested operator into kt (nth × ndv).
    fn integrate(
        &mut self,
        kt: &mut Matrix,
        state: &mut CurrentState,
        rotation: &Rotation,
        dt: f64,
        ktype: StiffnessMatrixType,
    ) -> Result<bool, StrError>;

    /// Returns the time step scaling factor proposed after the last call to `integrate`
    ///
    /// A factor below one asks for a smaller increment (it is mostly useful after a local
    /// failure); a factor above one allows a larger one. The driver only reads it when the
    /// dynamic time step scaling is enabled.
    fn time_step_scaling_factor(&self) -> f64 {
        1.0
    }

    /// Performs the packaging step at the beginning of the first period
    ///
    /// Behaviours may initialise auxiliary data from the material properties and external
    /// state variables already evaluated in `state`. Returns false if the behaviour rejects
    /// the data; the driver then carries on with a warning.
    fn do_packaging_step(&mut self, _state: &CurrentState, _rotation: &Rotation) -> Result<bool, StrError> {
        Ok(true)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
