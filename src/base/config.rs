use super::{OutOfBoundsPolicy, PredictionPolicy, StiffnessMatrixType, StiffnessUpdatingPolicy};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Holds the options of the nonlinear solver
///
/// The options are shared by all solver entry points of a run and control the
/// Newton-Raphson iterations, the sub-stepping and the log messages.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of Newton-Raphson iterations per (sub)step
    pub iter_max: usize,

    /// Maximum number of time step halvings allowed within one period
    pub m_sub_steps: usize,

    /// Convergence criterion on the driving variable corrections
    pub eeps: f64,

    /// Convergence criterion on the thermodynamic force residuals
    pub seps: f64,

    /// Prediction policy
    pub prediction_policy: PredictionPolicy,

    /// Operator requested from the behaviour during the iterations
    pub stiffness_matrix_type: StiffnessMatrixType,

    /// How often the Jacobian is recomputed
    pub stiffness_updating_policy: StiffnessUpdatingPolicy,

    /// Smallest acceptable time increment (sub-stepping floor)
    pub minimal_time_step: Option<f64>,

    /// Largest time increment (larger periods are split)
    pub maximal_time_step: Option<f64>,

    /// Lets the behaviour and the convergence history resize the time increment
    ///
    /// When enabled, the increment grows after a converged sub-step and shrinks after a
    /// failure by the factor proposed by the behaviour, bounded by the two factors below.
    pub dynamic_time_step_scaling: bool,

    /// Smallest reduction factor applied after a failed sub-step (0 < factor < 1)
    pub minimal_time_step_scaling_factor: f64,

    /// Largest growth factor applied after a converged sub-step (≥ 1)
    pub maximal_time_step_scaling_factor: f64,

    /// Compares the consistent tangent operator to a central-difference approximation
    pub compare_to_numerical_tangent: bool,

    /// Perturbation of the driving variables for the numerical tangent (default = 10 eeps)
    pub numerical_tangent_perturbation: Option<f64>,

    /// Largest acceptable deviation from the numerical tangent (default = (seps/1e-3) 1e7)
    pub tangent_comparison_criterion: Option<f64>,

    /// Bounds policy handed to the behaviour at construction
    pub out_of_bounds_policy: OutOfBoundsPolicy,

    /// Shows one line per converged step
    pub verbose_steps: bool,

    /// Shows one line per Newton-Raphson iteration
    pub verbose_iterations: bool,

    /// Shows the time step halvings
    pub verbose_sub_steps: bool,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            iter_max: 100,
            m_sub_steps: 10,
            eeps: 1e-12,
            seps: 1e-3,
            prediction_policy: PredictionPolicy::NoPrediction,
            stiffness_matrix_type: StiffnessMatrixType::ConsistentTangentOperator,
            stiffness_updating_policy: StiffnessUpdatingPolicy::UpdatedStiffnessMatrix,
            minimal_time_step: None,
            maximal_time_step: None,
            dynamic_time_step_scaling: false,
            minimal_time_step_scaling_factor: 0.1,
            maximal_time_step_scaling_factor: f64::MAX,
            compare_to_numerical_tangent: false,
            numerical_tangent_perturbation: None,
            tangent_comparison_criterion: None,
            out_of_bounds_policy: OutOfBoundsPolicy::None,
            verbose_steps: false,
            verbose_iterations: false,
            verbose_sub_steps: false,
        }
    }

    /// Sets the maximum number of iterations
    pub fn set_iter_max(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("iter_max must be ≥ 1");
        }
        self.iter_max = value;
        Ok(self)
    }

    /// Sets the maximum number of sub-steps
    ///
    /// **Note:** zero means that the first divergence fails the step.
    pub fn set_m_sub_steps(&mut self, value: usize) -> &mut Self {
        self.m_sub_steps = value;
        self
    }

    /// Sets the convergence criterion on driving variables
    pub fn set_eeps(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("eeps must be > 0.0");
        }
        self.eeps = value;
        Ok(self)
    }

    /// Sets the convergence criterion on thermodynamic forces
    pub fn set_seps(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("seps must be > 0.0");
        }
        self.seps = value;
        Ok(self)
    }

    /// Sets the prediction policy
    pub fn set_prediction_policy(&mut self, policy: PredictionPolicy) -> &mut Self {
        self.prediction_policy = policy;
        self
    }

    /// Sets the operator requested during the iterations
    pub fn set_stiffness_matrix_type(&mut self, ktype: StiffnessMatrixType) -> &mut Self {
        self.stiffness_matrix_type = ktype;
        self
    }

    /// Sets the stiffness updating policy
    pub fn set_stiffness_updating_policy(&mut self, policy: StiffnessUpdatingPolicy) -> &mut Self {
        self.stiffness_updating_policy = policy;
        self
    }

    /// Sets the minimal time step
    pub fn set_minimal_time_step(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("minimal_time_step must be > 0.0");
        }
        self.minimal_time_step = Some(value);
        Ok(self)
    }

    /// Sets the maximal time step
    pub fn set_maximal_time_step(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("maximal_time_step must be > 0.0");
        }
        self.maximal_time_step = Some(value);
        Ok(self)
    }

    /// Enables the dynamic time step scaling
    pub fn set_dynamic_time_step_scaling(&mut self, flag: bool) -> &mut Self {
        self.dynamic_time_step_scaling = flag;
        self
    }

    /// Sets the smallest reduction factor of the dynamic time step scaling
    pub fn set_minimal_time_step_scaling_factor(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value >= 1.0 {
            return Err("minimal_time_step_scaling_factor must be < 1.0");
        }
        if value < 100.0 * f64::EPSILON {
            return Err("minimal_time_step_scaling_factor is either negative or too small");
        }
        self.minimal_time_step_scaling_factor = value;
        Ok(self)
    }

    /// Sets the largest growth factor of the dynamic time step scaling
    pub fn set_maximal_time_step_scaling_factor(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 1.0 {
            return Err("maximal_time_step_scaling_factor must be ≥ 1.0");
        }
        self.maximal_time_step_scaling_factor = value;
        Ok(self)
    }

    /// Enables the comparison to the numerical tangent operator
    pub fn set_compare_to_numerical_tangent(&mut self, flag: bool) -> &mut Self {
        self.compare_to_numerical_tangent = flag;
        self
    }

    /// Sets the perturbation used by the numerical tangent operator
    pub fn set_numerical_tangent_perturbation(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("numerical_tangent_perturbation must be > 0.0");
        }
        self.numerical_tangent_perturbation = Some(value);
        Ok(self)
    }

    /// Sets the criterion used in the comparison to the numerical tangent operator
    pub fn set_tangent_comparison_criterion(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("tangent_comparison_criterion must be > 0.0");
        }
        self.tangent_comparison_criterion = Some(value);
        Ok(self)
    }

    /// Sets the out-of-bounds policy
    pub fn set_out_of_bounds_policy(&mut self, policy: OutOfBoundsPolicy) -> &mut Self {
        self.out_of_bounds_policy = policy;
        self
    }

    /// Sets all verbose flags at once
    pub fn set_verbose(&mut self, steps: bool, iterations: bool, sub_steps: bool) -> &mut Self {
        self.verbose_steps = steps;
        self.verbose_iterations = iterations;
        self.verbose_sub_steps = sub_steps;
        self
    }

    /// Returns the perturbation of the numerical tangent operator
    pub fn perturbation(&self) -> f64 {
        self.numerical_tangent_perturbation.unwrap_or(10.0 * self.eeps)
    }

    /// Returns the tolerance of the comparison to the numerical tangent operator
    pub fn comparison_criterion(&self) -> f64 {
        self.tangent_comparison_criterion.unwrap_or((self.seps / 1e-3) * 1e7)
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.iter_max < 1 {
            return Some(format!("iter_max = {} is incorrect; it must be ≥ 1", self.iter_max));
        }
        if self.eeps <= 0.0 {
            return Some(format!("eeps = {:?} is incorrect; it must be > 0.0", self.eeps));
        }
        if self.seps <= 0.0 {
            return Some(format!("seps = {:?} is incorrect; it must be > 0.0", self.seps));
        }
        if let (Some(dt_min), Some(dt_max)) = (self.minimal_time_step, self.maximal_time_step) {
            if dt_min > dt_max {
                return Some(format!(
                    "minimal_time_step = {:?} is incorrect; it must be ≤ maximal_time_step = {:?}",
                    dt_min, dt_max
                ));
            }
        }
        if self.minimal_time_step_scaling_factor >= 1.0
            || self.minimal_time_step_scaling_factor < 100.0 * f64::EPSILON
        {
            return Some(format!(
                "minimal_time_step_scaling_factor = {:?} is incorrect; it must be in ]100 ε, 1[",
                self.minimal_time_step_scaling_factor
            ));
        }
        if self.maximal_time_step_scaling_factor < 1.0 {
            return Some(format!(
                "maximal_time_step_scaling_factor = {:?} is incorrect; it must be ≥ 1.0",
                self.maximal_time_step_scaling_factor
            ));
        }
        if self.prediction_policy == PredictionPolicy::NoPrediction && self.iter_max < 2 {
            return Some(format!(
                "iter_max = {} is incorrect; NoPrediction requires at least 2 iterations",
                self.iter_max
            ));
        }
        if self.stiffness_updating_policy == StiffnessUpdatingPolicy::UpdatedStiffnessMatrix
            && self.stiffness_matrix_type == StiffnessMatrixType::NoStiffness
        {
            return Some(
                "stiffness_matrix_type = NoStiffness is incorrect; UpdatedStiffnessMatrix requires an operator".to_string(),
            );
        }
        None // all good
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Solver options\n")?;
        write!(f, "==============\n")?;
        write!(f, "iter_max = {:?}\n", self.iter_max)?;
        write!(f, "m_sub_steps = {:?}\n", self.m_sub_steps)?;
        write!(f, "eeps = {:?}\n", self.eeps)?;
        write!(f, "seps = {:?}\n", self.seps)?;
        write!(f, "prediction_policy = {:?}\n", self.prediction_policy)?;
        write!(f, "stiffness_matrix_type = {:?}\n", self.stiffness_matrix_type)?;
        write!(f, "stiffness_updating_policy = {:?}\n", self.stiffness_updating_policy)?;
        write!(f, "minimal_time_step = {:?}\n", self.minimal_time_step)?;
        write!(f, "maximal_time_step = {:?}\n", self.maximal_time_step)?;
        write!(f, "dynamic_time_step_scaling = {:?}\n", self.dynamic_time_step_scaling)?;
        write!(
            f,
            "minimal_time_step_scaling_factor = {:?}\n",
            self.minimal_time_step_scaling_factor
        )?;
        write!(
            f,
            "maximal_time_step_scaling_factor = {:?}\n",
            self.maximal_time_step_scaling_factor
        )?;
        write!(f, "compare_to_numerical_tangent = {:?}\n", self.compare_to_numerical_tangent)?;
        write!(f, "out_of_bounds_policy = {:?}\n", self.out_of_bounds_policy)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
