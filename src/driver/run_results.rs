use super::{CheckResult, CurrentState};
use crate::base::FailureCategory;
use crate::material::BehaviourDescription;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the state at the end of a committed period
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Snapshot {
    pub time: f64,
    pub period: usize,
    pub driving_variables: Vec<f64>,
    pub thermodynamic_forces: Vec<f64>,
    pub internal_state_variables: Vec<f64>,
    pub multipliers: Vec<f64>,
    pub iterations: usize, // total number of Newton-Raphson iterations in the period
    pub sub_steps: usize,  // number of converged sub-steps in the period
}

impl Snapshot {
    /// Allocates a new instance from the end-of-step values of the state
    pub fn new(state: &CurrentState, time: f64, iterations: usize, sub_steps: usize) -> Self {
        Snapshot {
            time,
            period: state.period,
            driving_variables: state.driving_variables().to_vec(),
            thermodynamic_forces: state.s1.as_data().clone(),
            internal_state_variables: state.iv1.as_data().clone(),
            multipliers: state.multipliers().to_vec(),
            iterations,
            sub_steps,
        }
    }
}

/// Holds the description of an unrecoverable step failure
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Failure {
    /// Index of the failed period
    pub period: usize,

    /// Time at the beginning of the failed sub-step
    pub time: f64,

    /// Category of the failure
    pub category: FailureCategory,

    /// Explanation
    pub message: String,
}

/// Holds the results of a run
///
/// A failed or cancelled run keeps all snapshots committed before the interruption.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunResults {
    pub driving_variable_names: Vec<String>,
    pub thermodynamic_force_names: Vec<String>,
    pub internal_state_variable_names: Vec<String>,
    pub snapshots: Vec<Snapshot>,
    pub checks: Vec<CheckResult>,
    pub warnings: Vec<String>,
    pub failure: Option<Failure>,
    pub cancelled: bool,
}

impl RunResults {
    /// Allocates a new (empty) instance
    pub fn new(description: &BehaviourDescription) -> Self {
        RunResults {
            driving_variable_names: description.driving_variables.clone(),
            thermodynamic_force_names: description.thermodynamic_forces.clone(),
            internal_state_variable_names: description.internal_state_variable_components(),
            snapshots: Vec::new(),
            checks: Vec::new(),
            warnings: Vec::new(),
            failure: None,
            cancelled: false,
        }
    }

    /// Returns true if the run reached the last time without failure
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && !self.cancelled
    }

    /// Returns true if all checks passed
    pub fn checks_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Returns the last snapshot
    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Returns the times of all snapshots
    pub fn times(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.time).collect()
    }

    /// Returns the history of a component given its name
    ///
    /// The name may refer to a driving variable, a thermodynamic force or an internal state variable component.
    pub fn series(&self, name: &str) -> Result<Vec<f64>, StrError> {
        if let Some(i) = self.driving_variable_names.iter().position(|n| n == name) {
            return Ok(self.snapshots.iter().map(|s| s.driving_variables[i]).collect());
        }
        if let Some(i) = self.thermodynamic_force_names.iter().position(|n| n == name) {
            return Ok(self.snapshots.iter().map(|s| s.thermodynamic_forces[i]).collect());
        }
        if let Some(i) = self.internal_state_variable_names.iter().position(|n| n == name) {
            return Ok(self.snapshots.iter().map(|s| s.internal_state_variables[i]).collect());
        }
        Err("the results do not contain the requested component")
    }

    /// Reads a JSON file containing the results
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
        let results = serde_json::from_reader(reader).map_err(|_| "deserialize failed")?;
        Ok(results)
    }

    /// Writes a JSON file with the results
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
