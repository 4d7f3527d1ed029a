use super::{compare_to_numerical_tangent, AccelerationAlgorithm, ConstraintSet, ControlConvergence, CurrentState, WorkSpace};
use crate::base::{Config, EvolutionManager, FailureCategory, PredictionPolicy, StiffnessMatrixType, StiffnessUpdatingPolicy};
use crate::material::{hooke_operator, Behaviour, BehaviourDescription, Rotation};
use crate::StrError;
use russell_lab::{mat_norm, mat_vec_mul, solve_lin_sys, vec_update, Matrix, Norm};

/// Holds the result of one step
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// The Newton-Raphson iterations converged
    Converged { iterations: usize },

    /// The step failed; the time increment may be reduced and the step retried
    Diverged(FailureCategory),
}

/// Computes the isotropic thermal strain from the `ThermalExpansion` and `Temperature` evolutions
///
/// ```text
/// ε_th(t) = α(t) (T(t) - Tref) - α(t0) (T(t0) - Tref)
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ThermalStrain {
    /// Reference temperature
    pub tref: f64,

    /// Initial time
    pub t0: f64,
}

impl ThermalStrain {
    /// Evaluates the thermal strain at time t
    pub fn value(&self, evolutions: &EvolutionManager, t: f64) -> Result<f64, StrError> {
        let alpha = evolutions.value("ThermalExpansion", t)?;
        let temp = evolutions.value("Temperature", t)?;
        let alpha0 = evolutions.value("ThermalExpansion", self.t0)?;
        let temp0 = evolutions.value("Temperature", self.t0)?;
        Ok(alpha * (temp - self.tref) - alpha0 * (temp0 - self.tref))
    }
}

/// Implements the Newton-Raphson solver of one time increment
///
/// States: `INIT → PREDICT → ITERATE → {Converged, Diverged}`. Failures inside an
/// iteration (local integration failure, singular Jacobian, NaN or Inf, exhausted
/// iterations) are returned as `StepOutcome::Diverged`; only configuration errors are
/// returned as `Err`.
///
/// The step converges on the unknowns at which the residual was evaluated: the last
/// correction (smaller than `eeps`) is not applied, so `u1` matches `s1` and `iv1`.
pub struct StepSolver<'a> {
    /// Holds the solver options
    pub config: &'a Config,

    /// Holds the evolutions (read-only)
    pub evolutions: &'a EvolutionManager,

    /// Holds the constraints (resolved)
    pub constraints: &'a ConstraintSet,

    /// Holds the rotation from the global frame to the material frame
    pub rotation: &'a Rotation,

    /// Holds the acceleration algorithm, if any
    pub acceleration: Option<&'a dyn AccelerationAlgorithm>,

    /// Holds the thermal strain definition, if any
    pub thermal_strain: Option<ThermalStrain>,

    /// Holds the indices of `YoungModulus` and `PoissonRatio` in the material properties
    pub elastic_properties: Option<(usize, usize)>,

    /// Controls the convergence
    pub control: ControlConvergence<'a>,
}

impl<'a> StepSolver<'a> {
    /// Allocates a new instance
    pub fn new(
        config: &'a Config,
        evolutions: &'a EvolutionManager,
        constraints: &'a ConstraintSet,
        rotation: &'a Rotation,
        ndv: usize,
    ) -> Self {
        StepSolver {
            config,
            evolutions,
            constraints,
            rotation,
            acceleration: None,
            thermal_strain: None,
            elastic_properties: None,
            control: ControlConvergence::new(config, ndv),
        }
    }

    /// Solves the step from t to t + Δt
    ///
    /// On convergence, the end-of-step values of the state hold the solution; the state is
    /// not committed.
    pub fn solve(
        &mut self,
        behaviour: &mut dyn Behaviour,
        state: &mut CurrentState,
        ws: &mut WorkSpace,
        t: f64,
        dt: f64,
    ) -> Result<StepOutcome, StrError> {
        ws.check(state)?;
        let t1 = t + dt;
        let ndv = state.n_driving_variables();

        // INIT
        state.revert();
        for v in &mut state.u1.as_mut_data()[ndv..] {
            *v = 0.0;
        }
        self.update_external_values(behaviour.description(), state, t, dt)?;
        if state.period == 0 && !behaviour.do_packaging_step(state, self.rotation)? {
            let warning = "the packaging step failed".to_string();
            if self.config.verbose_steps {
                println!("WARNING: {}", warning);
            }
            if !ws.warnings.contains(&warning) {
                ws.warnings.push(warning);
            }
        }
        self.constraints.pin(&mut state.u1, self.evolutions, t1)?;
        self.control.reset();
        let updated = match self.config.stiffness_updating_policy {
            StiffnessUpdatingPolicy::UpdatedStiffnessMatrix => true,
            StiffnessUpdatingPolicy::ConstantStiffness => {
                if !ws.kp_ready && !self.update_constant_operator(behaviour, state, ws)? {
                    return Ok(StepOutcome::Diverged(FailureCategory::LocalIntegration));
                }
                false
            }
            StiffnessUpdatingPolicy::ConstantStiffnessByPeriod => {
                if !self.update_constant_operator(behaviour, state, ws)? {
                    return Ok(StepOutcome::Diverged(FailureCategory::LocalIntegration));
                }
                false
            }
        };

        // PREDICT
        if let Some(outcome) = self.predict(behaviour, state, ws, t1, dt)? {
            return Ok(outcome);
        }

        // ITERATE
        let ktype = if updated {
            self.config.stiffness_matrix_type
        } else {
            StiffnessMatrixType::NoStiffness
        };
        let compare = updated
            && self.config.compare_to_numerical_tangent
            && ktype == StiffnessMatrixType::ConsistentTangentOperator;
        for iter in 1..=self.config.iter_max {
            // behaviour
            if !behaviour.integrate(&mut ws.kt, state, self.rotation, dt, ktype)? {
                return Ok(StepOutcome::Diverged(FailureCategory::LocalIntegration));
            }
            if compare {
                if let Some(warning) = compare_to_numerical_tangent(behaviour, state, ws, self.rotation, dt, self.config)? {
                    ws.warnings.push(warning);
                }
            }
            let satisfied = self.constraints.satisfied(
                &state.u1,
                &state.s1,
                self.evolutions,
                t1,
                self.config.eeps,
                self.config.seps,
            )?;

            // assembly
            let op = if updated { &ws.kt } else { &ws.kp };
            if ws.normalisation.is_none() {
                ws.normalisation = Some(normalisation_factor(op));
            }
            let a = ws.normalisation.unwrap_or(1.0);
            self.constraints
                .assemble(&mut ws.kk, &mut ws.rr, op, &state.s1, &state.u1, self.evolutions, t1, a)?;
            ws.u_eval.as_mut_data().copy_from_slice(state.u1.as_data());
            self.control.analyze_rr(iter, &ws.rr);
            if self.control.found_nan_or_inf() {
                return Ok(StepOutcome::Diverged(FailureCategory::GlobalConvergence));
            }

            // correction
            if !solve_system(ws) {
                return Ok(StepOutcome::Diverged(FailureCategory::NumericalSingularity));
            }
            self.control.analyze_du(&ws.du);

            // convergence
            self.control.set_constraints_satisfied(satisfied);
            self.control.print_iteration();
            if self.control.converged() {
                return Ok(StepOutcome::Converged { iterations: iter });
            }
            vec_update(&mut state.u1, -1.0, &ws.du)?;
            self.constraints.pin(&mut state.u1, self.evolutions, t1)?;

            // acceleration
            if let Some(acceleration) = self.acceleration {
                if acceleration.execute(&mut state.u1, &ws.u_eval, &ws.rr, iter, self.config.seps, &mut ws.acc)? {
                    self.constraints.pin(&mut state.u1, self.evolutions, t1)?;
                }
            }
        }
        Ok(StepOutcome::Diverged(FailureCategory::GlobalConvergence))
    }

    /// Evaluates the material properties, the external state variables and the thermal strain
    fn update_external_values(
        &self,
        description: &BehaviourDescription,
        state: &mut CurrentState,
        t: f64,
        dt: f64,
    ) -> Result<(), StrError> {
        let t1 = t + dt;
        for (k, name) in description.material_properties.iter().enumerate() {
            state.mprops1[k] = self.evolutions.value(name, t1)?;
        }
        for (k, name) in description.external_state_variables.iter().enumerate() {
            let v0 = self.evolutions.value(name, t)?;
            state.esv0[k] = v0;
            state.desv[k] = self.evolutions.value(name, t1)? - v0;
        }
        if let Some(thermal) = &self.thermal_strain {
            let e1 = thermal.value(self.evolutions, t1)?;
            let n = usize::min(3, state.n_driving_variables());
            for i in 0..n {
                state.e_th1[i] = e1;
            }
        }
        Ok(())
    }

    /// Computes the operator of the constant stiffness policies
    fn update_constant_operator(
        &self,
        behaviour: &mut dyn Behaviour,
        state: &CurrentState,
        ws: &mut WorkSpace,
    ) -> Result<bool, StrError> {
        let ktype = match self.config.stiffness_matrix_type {
            StiffnessMatrixType::SecantOperator => StiffnessMatrixType::SecantOperator,
            StiffnessMatrixType::TangentOperator => StiffnessMatrixType::TangentOperator,
            _ => StiffnessMatrixType::Elastic,
        };
        let ok = behaviour.compute_prediction_operator(&mut ws.kp, state, self.rotation, ktype)?;
        ws.kp_ready = ok;
        Ok(ok)
    }

    /// Computes the initial estimate of the unknowns
    ///
    /// Returns the outcome if the prediction fails.
    fn predict(
        &self,
        behaviour: &mut dyn Behaviour,
        state: &mut CurrentState,
        ws: &mut WorkSpace,
        t1: f64,
        dt: f64,
    ) -> Result<Option<StepOutcome>, StrError> {
        let ndv = state.n_driving_variables();
        match self.config.prediction_policy {
            PredictionPolicy::NoPrediction => return Ok(None),
            PredictionPolicy::LinearPrediction => {
                if state.dt_1 > 0.0 {
                    let ratio = dt / state.dt_1;
                    for i in 0..ndv {
                        state.u1[i] = state.u0[i] + (state.u0[i] - state.u_1[i]) * ratio;
                    }
                    self.constraints.pin(&mut state.u1, self.evolutions, t1)?;
                }
                return Ok(None);
            }
            PredictionPolicy::ElasticPredictionFromMaterialProperties => {
                let (i_young, i_poisson) = self
                    .elastic_properties
                    .ok_or("the elastic prediction requires the YoungModulus and PoissonRatio material properties")?;
                hooke_operator(&mut ws.kt, state.mprops1[i_young], state.mprops1[i_poisson])?;
            }
            policy => {
                let ktype = policy.operator().unwrap_or(StiffnessMatrixType::Elastic);
                if !behaviour.compute_prediction_operator(&mut ws.kt, state, self.rotation, ktype)? {
                    return Ok(Some(StepOutcome::Diverged(FailureCategory::LocalIntegration)));
                }
            }
        }

        // linearized thermodynamic forces: s_lin = s0 + K Δε_mech
        for i in 0..ndv {
            ws.de[i] = state.mechanical_increment(i);
        }
        mat_vec_mul(&mut ws.s_lin, 1.0, &ws.kt, &ws.de)?;
        vec_update(&mut ws.s_lin, 1.0, &state.s0)?;

        // solve the linearized problem
        if ws.normalisation.is_none() {
            ws.normalisation = Some(normalisation_factor(&ws.kt));
        }
        let a = ws.normalisation.unwrap_or(1.0);
        self.constraints
            .assemble(&mut ws.kk, &mut ws.rr, &ws.kt, &ws.s_lin, &state.u1, self.evolutions, t1, a)?;
        if !solve_system(ws) {
            return Ok(Some(StepOutcome::Diverged(FailureCategory::NumericalSingularity)));
        }
        vec_update(&mut state.u1, -1.0, &ws.du)?;
        self.constraints.pin(&mut state.u1, self.evolutions, t1)?;
        Ok(None)
    }
}

/// Returns the largest absolute entry of the operator (or one if the operator is zero)
fn normalisation_factor(op: &Matrix) -> f64 {
    let max = mat_norm(op, Norm::Max);
    if max > 0.0 && max.is_finite() {
        max
    } else {
        1.0
    }
}

/// Solves `kk · du = rr` (the factorization overwrites `kk`)
///
/// Returns false if the matrix is singular or the solution is not finite.
fn solve_system(ws: &mut WorkSpace) -> bool {
    ws.du.as_mut_data().copy_from_slice(ws.rr.as_data());
    match solve_lin_sys(&mut ws.du, &mut ws.kk) {
        Ok(()) => ws.du.as_data().iter().all(|v| v.is_finite()),
        Err(_) => false,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
