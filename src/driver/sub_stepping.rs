use super::{CurrentState, StepOutcome, StepSolver, WorkSpace};
use crate::base::FailureCategory;
use crate::material::Behaviour;
use crate::StrError;

/// Holds the result of the integration over one requested interval
#[derive(Clone, Debug, PartialEq)]
pub enum PeriodOutcome {
    /// The whole interval has been covered
    Completed {
        /// Total number of Newton-Raphson iterations
        iterations: usize,

        /// Time increments of the converged sub-steps (their sum equals the interval)
        time_steps: Vec<f64>,
    },

    /// The sub-step budget or the minimal time step has been exhausted
    Failed {
        /// Time at the beginning of the failed sub-step
        time: f64,

        /// Category of the last failure
        category: FailureCategory,

        /// Explanation
        message: String,
    },
}

/// Integrates the interval [ti, te], reducing the time increment on divergence
///
/// The state is committed after every converged sub-step. Without dynamic scaling, the
/// time increment is halved after every failure. With dynamic scaling, the increment is
/// multiplied after every sub-step by the factor proposed by the behaviour:
///
/// * converged with factor ≥ 1: `Δt ← Δt · max(min(factor, f_max), 1)`
/// * converged with factor < 1: the sub-step is rejected and `Δt ← Δt · max(factor, f_min)`
/// * diverged: `Δt ← Δt · max(min(factor, 0.5), f_min)`
///
/// and then bounded by `maximal_time_step`; a remainder shorter than `minimal_time_step`
/// is merged into the current sub-step.
///
/// The step fails when the number of failures exceeds `m_sub_steps` or when the reduced
/// increment falls below `minimal_time_step`. The last sub-step is clamped so that the
/// interval is covered exactly.
pub fn integrate_period(
    solver: &mut StepSolver,
    behaviour: &mut dyn Behaviour,
    state: &mut CurrentState,
    ws: &mut WorkSpace,
    ti: f64,
    te: f64,
) -> Result<PeriodOutcome, StrError> {
    if te <= ti {
        return Err("the end of the interval must be greater than its beginning");
    }
    let config = solver.config;
    let dynamic = config.dynamic_time_step_scaling;
    let t_eps = (te - ti) * 100.0 * f64::EPSILON;
    let aone = 1.0 - 10.0 * f64::EPSILON;
    let mut t = ti;
    let mut dt = match (dynamic, config.maximal_time_step) {
        (true, Some(dt_max)) => f64::min(te - ti, dt_max),
        _ => te - ti,
    };
    let mut n_failures = 0;
    let mut iterations = 0;
    let mut time_steps = Vec::new();
    while te - t > t_eps {
        if t + dt > te - t_eps {
            dt = te - t;
        }
        let outcome = solver.solve(behaviour, state, ws, t, dt)?;
        let factor = if dynamic {
            behaviour.time_step_scaling_factor()
        } else {
            1.0
        };
        let (category, accepted_locally) = match outcome {
            StepOutcome::Converged { iterations: n } if factor >= aone => {
                state.commit(dt);
                iterations += n;
                time_steps.push(dt);
                t += dt;
                if dynamic {
                    dt *= f64::max(f64::min(config.maximal_time_step_scaling_factor, factor), 1.0);
                }
                (None, true)
            }
            StepOutcome::Converged { .. } => (Some(FailureCategory::LocalIntegration), true),
            StepOutcome::Diverged(category) => (Some(category), false),
        };
        if let Some(category) = category {
            n_failures += 1;
            solver.control.print_sub_step_failure(t, dt, category);
            state.revert();
            if n_failures > config.m_sub_steps {
                return Ok(PeriodOutcome::Failed {
                    time: t,
                    category,
                    message: "the maximum number of sub-steps has been reached".to_string(),
                });
            }
            dt *= if !dynamic {
                0.5
            } else if accepted_locally {
                f64::max(factor, config.minimal_time_step_scaling_factor)
            } else {
                f64::max(f64::min(0.5, factor), config.minimal_time_step_scaling_factor)
            };
            if let Some(dt_min) = config.minimal_time_step {
                if dt < dt_min {
                    return Ok(PeriodOutcome::Failed {
                        time: t,
                        category,
                        message: "the time increment is below the minimal time step".to_string(),
                    });
                }
            }
        }
        if dynamic {
            if let Some(dt_max) = config.maximal_time_step {
                dt = f64::min(dt, dt_max);
            }
            if let Some(dt_min) = config.minimal_time_step {
                if dt > te - t - dt_min {
                    dt = te - t;
                }
            }
        }
    }
    Ok(PeriodOutcome::Completed { iterations, time_steps })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{integrate_period, PeriodOutcome};
    use crate::base::{Config, EvolutionManager, FailureCategory, Hypothesis, StiffnessMatrixType};
    use crate::driver::{ConstraintSet, CurrentState, StepSolver, WorkSpace};
    use crate::material::{Behaviour, BehaviourDescription, BehaviourType, Rotation};
    use crate::StrError;
    use russell_lab::{approx_eq, Matrix};

    /// Behaves as a unit spring for time increments up to dt_max
    ///
    /// Larger increments fail (or converge with the small factor if `converge_anyway`).
    struct Stub {
        description: BehaviourDescription,
        dt_max: f64,
        small_factor: f64,
        large_factor: f64,
        converge_anyway: bool,
        factor: f64,
    }

    impl Stub {
        fn new(dt_max: f64) -> Self {
            let mut description = BehaviourDescription::new(
                BehaviourType::SmallStrain,
                Hypothesis::AxisymmetricalGeneralisedPlaneStrain,
            );
            description.external_state_variables = vec!["Temperature".to_string()];
            Stub {
                description,
                dt_max,
                small_factor: 1.0,
                large_factor: 1.0,
                converge_anyway: false,
                factor: 1.0,
            }
        }
    }

    impl Behaviour for Stub {
        fn description(&self) -> &BehaviourDescription {
            &self.description
        }
        fn compute_prediction_operator(
            &mut self,
            kt: &mut Matrix,
            _state: &CurrentState,
            _rotation: &Rotation,
            _ktype: StiffnessMatrixType,
        ) -> Result<bool, StrError> {
            kt.set(0, 0, 1.0);
            Ok(true)
        }
        fn integrate(
            &mut self,
            kt: &mut Matrix,
            state: &mut CurrentState,
            _rotation: &Rotation,
            dt: f64,
            _ktype: StiffnessMatrixType,
        ) -> Result<bool, StrError> {
            if dt > self.dt_max {
                self.factor = self.small_factor;
                if !self.converge_anyway {
                    return Ok(false);
                }
            } else {
                self.factor = self.large_factor;
            }
            for i in 0..3 {
                kt.set(i, i, 1.0);
                state.s1[i] = state.u1[i];
            }
            Ok(true)
        }
        fn time_step_scaling_factor(&self) -> f64 {
            self.factor
        }
    }

    fn run_with(model: &mut Stub, config: &Config, ti: f64, te: f64) -> PeriodOutcome {
        let mut evm = EvolutionManager::new();
        evm.set_value("Temperature", 293.15).unwrap();
        let constraints = ConstraintSet::new();
        let rotation = Rotation::identity();
        let mut state = CurrentState::new(model.description(), 0);
        let mut ws = WorkSpace::new(&state, 0);
        let mut solver = StepSolver::new(config, &evm, &constraints, &rotation, 3);
        integrate_period(&mut solver, model, &mut state, &mut ws, ti, te).unwrap()
    }

    fn run(m_sub_steps: usize, dt_min: Option<f64>) -> PeriodOutcome {
        let mut config = Config::new();
        config.set_m_sub_steps(m_sub_steps);
        if let Some(dt_min) = dt_min {
            config.set_minimal_time_step(dt_min).unwrap();
        }
        run_with(&mut Stub::new(0.3), &config, 0.0, 1.0)
    }

    fn time_steps_of(outcome: PeriodOutcome) -> Vec<f64> {
        match outcome {
            PeriodOutcome::Completed { time_steps, .. } => time_steps,
            _ => panic!("the period should be completed"),
        }
    }

    #[test]
    fn halving_recovers_the_step() {
        match run(4, None) {
            PeriodOutcome::Completed { iterations, time_steps } => {
                assert_eq!(time_steps, &[0.25, 0.25, 0.25, 0.25]);
                approx_eq(time_steps.iter().sum::<f64>(), 1.0, 1e-15);
                assert_eq!(iterations, 8);
            }
            _ => panic!("the period should be completed"),
        }
    }

    #[test]
    fn exhausted_budget_is_reported() {
        match run(0, None) {
            PeriodOutcome::Failed { time, category, message } => {
                assert_eq!(time, 0.0);
                assert_eq!(category, FailureCategory::LocalIntegration);
                assert_eq!(message, "the maximum number of sub-steps has been reached");
            }
            _ => panic!("the period should fail"),
        }
        match run(1, None) {
            PeriodOutcome::Failed { .. } => (),
            _ => panic!("the period should fail"),
        }
    }

    #[test]
    fn minimal_time_step_is_respected() {
        match run(10, Some(0.4)) {
            PeriodOutcome::Failed { message, .. } => {
                assert_eq!(message, "the time increment is below the minimal time step");
            }
            _ => panic!("the period should fail"),
        }
    }

    #[test]
    fn short_intervals_are_integrated() {
        let config = Config::new();
        let mut model = Stub::new(1.0);
        match run_with(&mut model, &config, 0.0, 1e-15) {
            PeriodOutcome::Completed { iterations, time_steps } => {
                assert_eq!(time_steps, &[1e-15]);
                assert_eq!(iterations, 2);
            }
            _ => panic!("the period should be completed"),
        }

        // the interval is much shorter than the spacing tolerance of the absolute time
        let (ti, te) = (1e9, 1e9 + 1e-6);
        match run_with(&mut model, &config, ti, te) {
            PeriodOutcome::Completed { iterations, time_steps } => {
                assert_eq!(time_steps.len(), 1);
                assert_eq!(time_steps[0], te - ti);
                assert_eq!(iterations, 2);
            }
            _ => panic!("the period should be completed"),
        }
    }

    #[test]
    fn dynamic_scaling_follows_the_behaviour() {
        let mut config = Config::new();
        config
            .set_dynamic_time_step_scaling(true)
            .set_maximal_time_step_scaling_factor(1.5)
            .unwrap();
        let mut model = Stub::new(0.3);
        model.small_factor = 0.25;
        model.large_factor = 2.0;
        let time_steps = time_steps_of(run_with(&mut model, &config, 0.0, 1.0));
        // grow by 1.5 (bounded) after convergence, shrink by 0.25 after failure
        assert_eq!(
            time_steps,
            &[0.25, 0.09375, 0.140625, 0.2109375, 0.0791015625, 0.11865234375, 0.10693359375]
        );
        assert_eq!(time_steps.iter().sum::<f64>(), 1.0);

        // the reduction is bounded by the minimal factor
        config.set_minimal_time_step_scaling_factor(0.5).unwrap();
        model.large_factor = 1.0;
        let time_steps = time_steps_of(run_with(&mut model, &config, 0.0, 1.0));
        assert_eq!(time_steps, &[0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn dynamic_scaling_rejects_converged_steps_with_small_factors() {
        let mut model = Stub::new(0.3);
        model.small_factor = 0.5;
        model.converge_anyway = true;

        // the factor is ignored without dynamic scaling
        let mut config = Config::new();
        assert_eq!(time_steps_of(run_with(&mut model, &config, 0.0, 1.0)), &[1.0]);

        config.set_dynamic_time_step_scaling(true);
        assert_eq!(
            time_steps_of(run_with(&mut model, &config, 0.0, 1.0)),
            &[0.25, 0.25, 0.25, 0.25]
        );
    }

    #[test]
    fn dynamic_scaling_respects_the_time_step_bounds() {
        let mut config = Config::new();
        config
            .set_dynamic_time_step_scaling(true)
            .set_maximal_time_step(0.4)
            .unwrap()
            .set_minimal_time_step(0.1)
            .unwrap();
        let mut model = Stub::new(1.0);
        model.large_factor = 10.0;
        // 0.4, 0.4 and a remainder of 0.2 (not shorter than the minimal time step)
        let time_steps = time_steps_of(run_with(&mut model, &config, 0.0, 1.0));
        assert_eq!(time_steps.len(), 3);
        approx_eq(time_steps[0], 0.4, 1e-15);
        approx_eq(time_steps[1], 0.4, 1e-15);
        approx_eq(time_steps[2], 0.2, 1e-15);

        // a remainder shorter than the minimal time step is merged
        let time_steps = time_steps_of(run_with(&mut model, &config, 0.0, 0.85));
        assert_eq!(time_steps.len(), 2);
        approx_eq(time_steps[0], 0.4, 1e-15);
        approx_eq(time_steps[1], 0.45, 1e-15);
    }

    #[test]
    fn empty_interval_is_an_error() {
        let description = BehaviourDescription::new(BehaviourType::SmallStrain, Hypothesis::Tridimensional);
        let mut model = Stub {
            description,
            dt_max: 1.0,
            small_factor: 1.0,
            large_factor: 1.0,
            converge_anyway: false,
            factor: 1.0,
        };
        let evm = EvolutionManager::new();
        let constraints = ConstraintSet::new();
        let config = Config::new();
        let rotation = Rotation::identity();
        let mut state = CurrentState::new(model.description(), 0);
        let mut ws = WorkSpace::new(&state, 0);
        let mut solver = StepSolver::new(&config, &evm, &constraints, &rotation, 6);
        assert_eq!(
            integrate_period(&mut solver, &mut model, &mut state, &mut ws, 1.0, 1.0).err(),
            Some("the end of the interval must be greater than its beginning")
        );
    }
}
