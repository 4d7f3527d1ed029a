use super::CurrentState;
use crate::base::EvolutionManager;
use crate::material::BehaviourDescription;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Identifies a component of the state
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VariableRef {
    DrivingVariable(usize),
    ThermodynamicForce(usize),
    InternalStateVariable(usize),
}

impl VariableRef {
    /// Finds a component given its name
    pub fn find(description: &BehaviourDescription, name: &str) -> Option<Self> {
        if let Some(i) = description.driving_variables.iter().position(|n| n == name) {
            return Some(VariableRef::DrivingVariable(i));
        }
        if let Some(i) = description.thermodynamic_forces.iter().position(|n| n == name) {
            return Some(VariableRef::ThermodynamicForce(i));
        }
        description
            .internal_state_variable_components()
            .iter()
            .position(|n| n == name)
            .map(VariableRef::InternalStateVariable)
    }

    /// Returns the end-of-step value
    pub fn value(&self, state: &CurrentState) -> f64 {
        match self {
            VariableRef::DrivingVariable(i) => state.u1[*i],
            VariableRef::ThermodynamicForce(i) => state.s1[*i],
            VariableRef::InternalStateVariable(i) => state.iv1[*i],
        }
    }
}

/// Holds the outcome of a check
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CheckResult {
    /// Name of the checked component
    pub variable: String,

    /// Name of the reference evolution
    pub reference: String,

    /// Absolute tolerance
    pub tolerance: f64,

    /// Indicates whether all evaluations were within the tolerance
    pub passed: bool,

    /// Largest absolute error
    pub max_error: f64,

    /// Time of the first failed evaluation
    pub first_failure_time: Option<f64>,
}

impl CheckResult {
    /// Records an evaluation
    pub fn update(&mut self, error: f64, t: f64) {
        if error > self.max_error || error.is_nan() {
            self.max_error = error;
        }
        if !(error <= self.tolerance) {
            if self.passed {
                self.first_failure_time = Some(t);
            }
            self.passed = false;
        }
    }
}

/// Compares a component of the state with a reference evolution at every committed step
#[derive(Clone, Debug)]
pub struct Check {
    variable: String,
    reference: String,
    tolerance: f64,
    target: Option<VariableRef>,
}

impl Check {
    /// Allocates a new instance
    pub fn new(variable: &str, reference: &str, tolerance: f64) -> Result<Self, StrError> {
        if tolerance <= 0.0 {
            return Err("the tolerance of a check must be > 0.0");
        }
        Ok(Check {
            variable: variable.to_string(),
            reference: reference.to_string(),
            tolerance,
            target: None,
        })
    }

    /// Finds the component and checks the reference evolution
    pub fn resolve(&mut self, description: &BehaviourDescription, evolutions: &EvolutionManager) -> Result<(), StrError> {
        self.target = VariableRef::find(description, &self.variable);
        if self.target.is_none() {
            println!("ERROR: component {} is not declared by the behaviour", self.variable);
            return Err("check refers to an undeclared variable");
        }
        if !evolutions.contains(&self.reference) {
            println!("ERROR: evolution {} is not defined", self.reference);
            return Err("check refers to an undefined evolution");
        }
        Ok(())
    }

    /// Returns the absolute error at time t
    pub fn evaluate(&self, state: &CurrentState, evolutions: &EvolutionManager, t: f64) -> Result<f64, StrError> {
        let target = self.target.ok_or("check must be resolved first")?;
        let reference = evolutions.value(&self.reference, t)?;
        Ok(f64::abs(target.value(state) - reference))
    }

    /// Returns a new (passing) result
    pub fn new_result(&self) -> CheckResult {
        CheckResult {
            variable: self.variable.clone(),
            reference: self.reference.clone(),
            tolerance: self.tolerance,
            passed: true,
            max_error: 0.0,
            first_failure_time: None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
