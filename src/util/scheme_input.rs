use crate::base::{Config, Evolution};
use crate::driver::Scheme;
use crate::material::BehaviourHandle;
use crate::StrError;
use russell_lab::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the input data of an evolution
///
/// In JSON, a constant is a number and a piecewise linear evolution is
/// an object with `times` and `values`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EvolutionInput {
    Constant(f64),
    Linear { times: Vec<f64>, values: Vec<f64> },
}

impl EvolutionInput {
    /// Converts the input data into an evolution
    pub fn to_evolution(&self) -> Result<Evolution, StrError> {
        match self {
            EvolutionInput::Constant(value) => Ok(Evolution::Constant(*value)),
            EvolutionInput::Linear { times, values } => Evolution::new_linear(times, values),
        }
    }
}

/// Holds an imposed driving variable or thermodynamic force
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ImposedInput {
    pub component: String,
    pub evolution: EvolutionInput,
}

/// Holds a check of a component against a reference evolution
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CheckInput {
    pub component: String,
    pub reference: String,
    pub tolerance: f64,
}

/// Holds the acceleration algorithm and its parameters
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccelerationInput {
    pub algorithm: String,

    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// Holds the description of a material point test read from a JSON file
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SchemeInput {
    /// Behaviour to be tested
    pub behaviour: BehaviourHandle,

    /// Solver options
    #[serde(default)]
    pub config: Config,

    /// Time grid
    pub times: Vec<f64>,

    /// Material properties
    #[serde(default)]
    pub material_properties: BTreeMap<String, EvolutionInput>,

    /// External state variables (the temperature included)
    #[serde(default)]
    pub external_state_variables: BTreeMap<String, EvolutionInput>,

    /// Additional evolutions (e.g., check references, thermal expansion)
    #[serde(default)]
    pub evolutions: BTreeMap<String, EvolutionInput>,

    #[serde(default)]
    pub imposed_driving_variables: Vec<ImposedInput>,

    #[serde(default)]
    pub imposed_thermodynamic_forces: Vec<ImposedInput>,

    /// Material frame (the columns are the material axes)
    #[serde(default)]
    pub rotation_matrix: Option<[[f64; 3]; 3]>,

    #[serde(default)]
    pub acceleration: Option<AccelerationInput>,

    #[serde(default)]
    pub initial_driving_variables: Option<Vec<f64>>,

    #[serde(default)]
    pub initial_thermodynamic_forces: Option<Vec<f64>>,

    #[serde(default)]
    pub initial_internal_state_variables: BTreeMap<String, f64>,

    #[serde(default)]
    pub checks: Vec<CheckInput>,
}

impl SchemeInput {
    /// Allocates a new instance with a behaviour and a time grid
    pub fn new(behaviour: BehaviourHandle, times: &[f64]) -> Self {
        SchemeInput {
            behaviour,
            config: Config::new(),
            times: times.to_vec(),
            material_properties: BTreeMap::new(),
            external_state_variables: BTreeMap::new(),
            evolutions: BTreeMap::new(),
            imposed_driving_variables: Vec::new(),
            imposed_thermodynamic_forces: Vec::new(),
            rotation_matrix: None,
            acceleration: None,
            initial_driving_variables: None,
            initial_thermodynamic_forces: None,
            initial_internal_state_variables: BTreeMap::new(),
            checks: Vec::new(),
        }
    }

    /// Builds the scheme (the initialisation is not completed)
    pub fn build(&self) -> Result<Scheme, StrError> {
        let mut scheme = Scheme::new();
        scheme.set_config(self.config.clone())?;
        scheme.set_behaviour_from_handle(&self.behaviour)?;
        for (name, input) in &self.material_properties {
            scheme.set_material_property(name, input.to_evolution()?)?;
        }
        for (name, input) in &self.external_state_variables {
            scheme.set_external_state_variable(name, input.to_evolution()?)?;
        }
        for (name, input) in &self.evolutions {
            scheme.set_evolution(name, input.to_evolution()?)?;
        }
        for imposed in &self.imposed_driving_variables {
            scheme.impose_driving_variable(&imposed.component, imposed.evolution.to_evolution()?)?;
        }
        for imposed in &self.imposed_thermodynamic_forces {
            scheme.impose_thermodynamic_force(&imposed.component, imposed.evolution.to_evolution()?)?;
        }
        scheme.set_times(&self.times)?;
        if let Some(frame) = &self.rotation_matrix {
            scheme.set_rotation_matrix(Matrix::from(frame))?;
        }
        if let Some(acceleration) = &self.acceleration {
            scheme.set_acceleration_algorithm(&acceleration.algorithm)?;
            for (key, value) in &acceleration.parameters {
                scheme.set_acceleration_parameter(key, value)?;
            }
        }
        if let Some(values) = &self.initial_driving_variables {
            scheme.set_initial_driving_variables(values)?;
        }
        if let Some(values) = &self.initial_thermodynamic_forces {
            scheme.set_initial_thermodynamic_forces(values)?;
        }
        for (name, value) in &self.initial_internal_state_variables {
            scheme.set_internal_state_variable_initial_value(name, *value)?;
        }
        for check in &self.checks {
            scheme.add_check(&check.component, &check.reference, check.tolerance)?;
        }
        Ok(scheme)
    }

    /// Reads a JSON file containing the input data
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(&path).map_err(|_| "file not found")?;
        let reader = BufReader::new(file);
        let input = serde_json::from_reader(reader).map_err(|_| "deserialize failed")?;
        Ok(input)
    }

    /// Writes a JSON file with the input data
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
