use super::{integrate_period, new_acceleration_algorithm, AccelerationAlgorithm, Check, ConstraintKind, ConstraintSet};
use super::{CurrentState, Failure, PeriodOutcome, RunResults, Snapshot, StepSolver, ThermalStrain, WorkSpace};
use crate::base::{Config, Evolution, EvolutionManager, Hypothesis, PredictionPolicy};
use crate::material::{check_frame, Behaviour, BehaviourDescription, BehaviourHandle, BehaviourType, Rotation, SymmetryType};
use crate::StrError;
use russell_lab::Matrix;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default reference temperature of the thermal expansion
pub const DEFAULT_REFERENCE_TEMPERATURE: f64 = 293.15;

/// Implements the time integration driver of a material point test
///
/// A scheme gathers the behaviour, the evolutions (material properties, external state
/// variables, imposed values and check references), the constraints, the time grid and
/// the solver options. `complete_initialisation` validates everything and locks the
/// evolutions; `run` then integrates every interval of the time grid.
///
/// # Example
///
/// ```
/// use matpoint::prelude::*;
/// use matpoint::StrError;
///
/// fn main() -> Result<(), StrError> {
///     let mut scheme = Scheme::new();
///     let handle = BehaviourHandle::new("builtin", "", "LinearElastic", Hypothesis::Tridimensional);
///     scheme.set_behaviour_from_handle(&handle)?;
///     scheme.set_material_property("YoungModulus", Evolution::Constant(200_000.0))?;
///     scheme.set_material_property("PoissonRatio", Evolution::Constant(0.3))?;
///     scheme.set_external_state_variable("Temperature", Evolution::Constant(293.15))?;
///     scheme.impose_driving_variable("EXX", Evolution::new_linear(&[0.0, 1.0], &[0.0, 1e-3])?)?;
///     scheme.set_times(&[0.0, 0.5, 1.0])?;
///     let results = scheme.run()?;
///     assert!(results.succeeded());
///     assert_eq!(results.snapshots.len(), 3);
///     Ok(())
/// }
/// ```
pub struct Scheme {
    config: Config,
    behaviour: Option<Box<dyn Behaviour>>,
    evolutions: EvolutionManager,
    constraints: ConstraintSet,
    times: Vec<f64>,
    frame: Option<Matrix>,
    rotation: Rotation,
    acceleration: Option<Box<dyn AccelerationAlgorithm>>,
    initial_driving_variables: Option<Vec<f64>>,
    initial_thermodynamic_forces: Option<Vec<f64>>,
    initial_internal_state_variables: Vec<(String, f64)>,
    checks: Vec<Check>,
    thermal_strain: Option<ThermalStrain>,
    elastic_properties: Option<(usize, usize)>,
    initialised: bool,
}

impl Scheme {
    /// Allocates a new (empty) scheme with the default options
    pub fn new() -> Self {
        Scheme {
            config: Config::new(),
            behaviour: None,
            evolutions: EvolutionManager::new(),
            constraints: ConstraintSet::new(),
            times: Vec::new(),
            frame: None,
            rotation: Rotation::identity(),
            acceleration: None,
            initial_driving_variables: None,
            initial_thermodynamic_forces: None,
            initial_internal_state_variables: Vec::new(),
            checks: Vec::new(),
            thermal_strain: None,
            elastic_properties: None,
            initialised: false,
        }
    }

    /// Returns an error if the initialisation is complete
    fn check_not_initialised(&self) -> Result<(), StrError> {
        if self.initialised {
            Err("the scheme cannot be modified after the initialisation is complete")
        } else {
            Ok(())
        }
    }

    /// Sets the solver options
    ///
    /// **Note:** the out-of-bounds policy is handed to the behaviour when it is loaded;
    /// thus, the options should be set before `set_behaviour_from_handle`.
    pub fn set_config(&mut self, config: Config) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        self.config = config;
        Ok(self)
    }

    /// Returns the solver options
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the behaviour
    pub fn set_behaviour(&mut self, behaviour: Box<dyn Behaviour>) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        if self.behaviour.is_some() {
            return Err("the behaviour is already defined");
        }
        self.behaviour = Some(behaviour);
        Ok(self)
    }

    /// Loads and sets the behaviour identified by a handle
    pub fn set_behaviour_from_handle(&mut self, handle: &BehaviourHandle) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        if self.behaviour.is_some() {
            return Err("the behaviour is already defined");
        }
        let behaviour = handle.load(self.config.out_of_bounds_policy)?;
        self.set_behaviour(behaviour)
    }

    /// Returns the description of the behaviour
    pub fn description(&self) -> Option<&BehaviourDescription> {
        self.behaviour.as_ref().map(|b| b.description())
    }

    /// Defines (or rebinds) an evolution
    pub fn set_evolution(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        self.evolutions.insert(name, evolution)?;
        Ok(self)
    }

    /// Defines the evolution of a material property
    pub fn set_material_property(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, StrError> {
        self.set_evolution(name, evolution)
    }

    /// Defines the evolution of an external state variable
    pub fn set_external_state_variable(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, StrError> {
        self.set_evolution(name, evolution)
    }

    /// Returns the evolutions
    pub fn evolutions(&self) -> &EvolutionManager {
        &self.evolutions
    }

    /// Imposes the evolution of a driving variable component (e.g., "EXX")
    ///
    /// The evolution is registered under the name of the component.
    pub fn impose_driving_variable(&mut self, component: &str, evolution: Evolution) -> Result<&mut Self, StrError> {
        self.impose(ConstraintKind::DrivingVariable, component, evolution)
    }

    /// Imposes the evolution of a thermodynamic force component (e.g., "SXX")
    ///
    /// The evolution is registered under the name of the component.
    pub fn impose_thermodynamic_force(&mut self, component: &str, evolution: Evolution) -> Result<&mut Self, StrError> {
        self.impose(ConstraintKind::ThermodynamicForce, component, evolution)
    }

    fn impose(&mut self, kind: ConstraintKind, component: &str, evolution: Evolution) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        self.constraints.add(kind, component, component)?;
        self.evolutions.insert(component, evolution)?;
        Ok(self)
    }

    /// Returns the constraints
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Sets the time grid (at least two strictly increasing values)
    pub fn set_times(&mut self, times: &[f64]) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        if times.len() < 2 {
            return Err("at least two times are required");
        }
        if times.windows(2).any(|w| !(w[1] > w[0])) {
            return Err("the times must be strictly increasing");
        }
        self.times = times.to_vec();
        Ok(self)
    }

    /// Returns the time grid
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Sets the material frame: the columns are the material axes in the global frame
    ///
    /// Only orthotropic behaviours accept a rotation matrix.
    pub fn set_rotation_matrix(&mut self, frame: Matrix) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        check_frame(&frame)?;
        self.frame = Some(frame);
        Ok(self)
    }

    /// Selects the acceleration algorithm (`Cast3M`, `IronsTuck` or `Steffensen`)
    pub fn set_acceleration_algorithm(&mut self, name: &str) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        if self.acceleration.is_some() {
            return Err("the acceleration algorithm is already defined");
        }
        self.acceleration = Some(new_acceleration_algorithm(name)?);
        Ok(self)
    }

    /// Sets a parameter of the acceleration algorithm (`AccelerationTrigger` or `AccelerationPeriod`)
    pub fn set_acceleration_parameter(&mut self, key: &str, value: &str) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        match self.acceleration.as_mut() {
            Some(acceleration) => acceleration.set_parameter(key, value)?,
            None => return Err("the acceleration algorithm must be defined first"),
        }
        Ok(self)
    }

    /// Sets the initial values of all driving variables
    pub fn set_initial_driving_variables(&mut self, values: &[f64]) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        self.initial_driving_variables = Some(values.to_vec());
        Ok(self)
    }

    /// Sets the initial values of all thermodynamic forces
    pub fn set_initial_thermodynamic_forces(&mut self, values: &[f64]) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        self.initial_thermodynamic_forces = Some(values.to_vec());
        Ok(self)
    }

    /// Sets the initial value of an internal state variable component (e.g., "EquivalentPlasticStrain")
    pub fn set_internal_state_variable_initial_value(&mut self, component: &str, value: f64) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        self.initial_internal_state_variables.push((component.to_string(), value));
        Ok(self)
    }

    /// Adds a check comparing a component with a reference evolution at every committed period
    pub fn add_check(&mut self, component: &str, reference: &str, tolerance: f64) -> Result<&mut Self, StrError> {
        self.check_not_initialised()?;
        self.checks.push(Check::new(component, reference, tolerance)?);
        Ok(self)
    }

    /// Returns true if the initialisation is complete
    pub fn initialised(&self) -> bool {
        self.initialised
    }

    /// Validates the scheme, resolves the constraints and checks, and locks the evolutions
    pub fn complete_initialisation(&mut self) -> Result<(), StrError> {
        if self.initialised {
            return Err("the initialisation is already complete");
        }
        if let Some(msg) = self.config.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot initialise the scheme because config.validate() failed");
        }
        let description = match self.behaviour.as_ref() {
            Some(behaviour) => behaviour.description(),
            None => return Err("the behaviour must be defined first"),
        };
        description.validate()?;
        if self.times.is_empty() {
            return Err("the times must be defined first");
        }
        let t0 = self.times[0];

        // plane strain
        if description.hypothesis == Hypothesis::PlaneStrain
            && description.btype == BehaviourType::SmallStrain
            && !self.constraints.constrains("EZZ")
            && !self.constraints.constrains("SZZ")
        {
            self.constraints.add(ConstraintKind::DrivingVariable, "EZZ", "EZZ")?;
            self.evolutions.insert("EZZ", Evolution::Constant(0.0))?;
        }

        // evolutions
        for name in &description.material_properties {
            if !self.evolutions.contains(name) {
                println!("ERROR: material property {} has no evolution", name);
                return Err("a material property has no evolution");
            }
        }
        for name in &description.external_state_variables {
            if !self.evolutions.contains(name) {
                println!("ERROR: external state variable {} has no evolution", name);
                return Err("an external state variable has no evolution");
            }
        }
        self.constraints.resolve(description, &self.evolutions)?;

        // rotation
        self.rotation = match &self.frame {
            Some(frame) => {
                if description.symmetry != SymmetryType::Orthotropic {
                    return Err("a rotation matrix can only be given for orthotropic behaviours");
                }
                Rotation::new(frame, description)?
            }
            None => Rotation::identity(),
        };

        // elastic prediction from the material properties
        if self.config.prediction_policy == PredictionPolicy::ElasticPredictionFromMaterialProperties {
            let mps = &description.material_properties;
            let young = mps.iter().position(|n| n == "YoungModulus");
            let poisson = mps.iter().position(|n| n == "PoissonRatio");
            match (young, poisson, description.btype) {
                (Some(i), Some(j), BehaviourType::SmallStrain) => self.elastic_properties = Some((i, j)),
                _ => {
                    return Err("the elastic prediction from material properties requires a small strain behaviour with YoungModulus and PoissonRatio")
                }
            }
        }

        // thermal strain (unless the behaviour handles the expansion itself)
        if description.btype == BehaviourType::SmallStrain
            && self.evolutions.contains("ThermalExpansion")
            && !description.material_properties.iter().any(|n| n == "ThermalExpansion")
        {
            let name = "ThermalExpansionReferenceTemperature";
            let tref = if self.evolutions.contains(name) {
                if !self.evolutions.is_constant(name)? {
                    return Err("the reference temperature of the thermal expansion must be constant");
                }
                self.evolutions.value(name, t0)?
            } else {
                DEFAULT_REFERENCE_TEMPERATURE
            };
            self.thermal_strain = Some(ThermalStrain { tref, t0 });
        }

        // initial values
        if let Some(values) = &self.initial_driving_variables {
            if values.len() != description.n_driving_variables() {
                return Err("the number of initial driving variables is incorrect");
            }
        }
        if let Some(values) = &self.initial_thermodynamic_forces {
            if values.len() != description.n_thermodynamic_forces() {
                return Err("the number of initial thermodynamic forces is incorrect");
            }
        }
        let components = description.internal_state_variable_components();
        for (name, _) in &self.initial_internal_state_variables {
            if !components.contains(name) {
                println!("ERROR: internal state variable {} is not declared by the behaviour", name);
                return Err("the initial value refers to an undeclared internal state variable");
            }
        }

        // checks
        for check in &mut self.checks {
            check.resolve(description, &self.evolutions)?;
        }

        self.evolutions.lock();
        self.initialised = true;
        Ok(())
    }

    /// Allocates the current state and sets the initial values
    pub fn initialize_current_state(&self) -> Result<CurrentState, StrError> {
        if !self.initialised {
            return Err("the initialisation must be completed first");
        }
        let description = self.description().ok_or("the behaviour must be defined first")?;
        let ndv = description.n_driving_variables();
        let t0 = self.times[0];
        let mut state = CurrentState::new(description, self.constraints.n_lagrange_multipliers());
        description.initial_driving_variables(&mut state.u0.as_mut_data()[..ndv]);
        if let Some(values) = &self.initial_driving_variables {
            state.u0.as_mut_data()[..ndv].copy_from_slice(values);
        }
        if let Some(values) = &self.initial_thermodynamic_forces {
            state.s0.as_mut_data().copy_from_slice(values);
        }
        let components = description.internal_state_variable_components();
        for (name, value) in &self.initial_internal_state_variables {
            if let Some(i) = components.iter().position(|n| n == name) {
                state.iv0[i] = *value;
            }
        }
        for (k, name) in description.material_properties.iter().enumerate() {
            state.mprops1[k] = self.evolutions.value(name, t0)?;
        }
        for (k, name) in description.external_state_variables.iter().enumerate() {
            state.esv0[k] = self.evolutions.value(name, t0)?;
        }
        state.tref = match &self.thermal_strain {
            Some(thermal) => thermal.tref,
            None => DEFAULT_REFERENCE_TEMPERATURE,
        };
        state.revert();
        state.u_1.as_mut_data().copy_from_slice(state.u0.as_data());
        state.s_1.as_mut_data().copy_from_slice(state.s0.as_data());
        state.iv_1.as_mut_data().copy_from_slice(state.iv0.as_data());
        Ok(state)
    }

    /// Allocates the work space matching the current state
    pub fn initialize_work_space(&self, state: &CurrentState) -> Result<WorkSpace, StrError> {
        if !self.initialised {
            return Err("the initialisation must be completed first");
        }
        let n_scratch = self.acceleration.as_ref().map(|a| a.n_scratch()).unwrap_or(0);
        let ws = WorkSpace::new(state, n_scratch);
        ws.check(state)?;
        Ok(ws)
    }

    /// Runs the test
    ///
    /// Completes the initialisation if needed. A failed step stops the run: the results
    /// then hold all committed periods and the description of the failure.
    pub fn run(&mut self) -> Result<RunResults, StrError> {
        let cancel = AtomicBool::new(false);
        self.run_with_cancel(&cancel)
    }

    /// Runs the test, checking the cancellation flag between periods
    pub fn run_with_cancel(&mut self, cancel: &AtomicBool) -> Result<RunResults, StrError> {
        if !self.initialised {
            self.complete_initialisation()?;
        }
        let mut state = self.initialize_current_state()?;
        let mut ws = self.initialize_work_space(&state)?;
        let behaviour = self.behaviour.as_mut().ok_or("the behaviour must be defined first")?;
        let mut results = RunResults::new(behaviour.description());
        results.checks = self.checks.iter().map(|c| c.new_result()).collect();
        let ndv = state.n_driving_variables();

        // solver
        let mut solver = StepSolver::new(&self.config, &self.evolutions, &self.constraints, &self.rotation, ndv);
        solver.acceleration = self.acceleration.as_deref();
        solver.thermal_strain = self.thermal_strain;
        solver.elastic_properties = self.elastic_properties;

        // initial state
        let t0 = self.times[0];
        results.snapshots.push(Snapshot::new(&state, t0, 0, 0));
        solver.control.print_header();

        // loop over the periods
        for k in 0..(self.times.len() - 1) {
            if cancel.load(Ordering::Relaxed) {
                results.cancelled = true;
                break;
            }
            let (ti, te) = (self.times[k], self.times[k + 1]);
            let n_split = match self.config.maximal_time_step {
                Some(dt_max) if !self.config.dynamic_time_step_scaling => {
                    f64::max(f64::ceil((te - ti) / dt_max), 1.0) as usize
                }
                _ => 1,
            };
            let mut iterations = 0;
            let mut sub_steps = 0;
            let mut failure = None;
            for m in 0..n_split {
                let a = ti + (te - ti) * (m as f64) / (n_split as f64);
                let b = if m + 1 == n_split {
                    te
                } else {
                    ti + (te - ti) * ((m + 1) as f64) / (n_split as f64)
                };
                solver.control.print_step(state.period, a, b - a);
                match integrate_period(&mut solver, &mut **behaviour, &mut state, &mut ws, a, b)? {
                    PeriodOutcome::Completed { iterations: n, time_steps } => {
                        iterations += n;
                        sub_steps += time_steps.len();
                    }
                    PeriodOutcome::Failed { time, category, message } => {
                        failure = Some(Failure {
                            period: state.period,
                            time,
                            category,
                            message,
                        });
                        break;
                    }
                }
            }
            results.warnings.append(&mut ws.warnings);
            if let Some(failure) = failure {
                println!(
                    "ERROR: period {} failed at t = {:?} ({:?}): {}",
                    failure.period, failure.time, failure.category, failure.message
                );
                results.failure = Some(failure);
                break;
            }

            // commit
            state.period += 1;
            for (check, result) in self.checks.iter().zip(results.checks.iter_mut()) {
                let error = check.evaluate(&state, &self.evolutions, te)?;
                result.update(error, te);
            }
            results.snapshots.push(Snapshot::new(&state, te, iterations, sub_steps));
        }
        solver.control.print_footer();
        Ok(results)
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
