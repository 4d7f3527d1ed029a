use matpoint::prelude::*;
use matpoint::StrError;
use russell_lab::approx_eq;

// Constant stiffness iterations with and without acceleration
//
// TEST GOAL
//
// Verifies that the fixed-point iterations with the elastic operator reach the same
// solution as the Newton-Raphson iterations, with or without an acceleration algorithm.
//
// LOADING
//
// * EXX increases linearly from 0 to 3e-3 within 3 periods
//
// CONFIGURATION AND PARAMETERS
//
// * Tridimensional, von Mises
// * Young: E = 200000, Poisson: ν = 0.3
// * Yield stress: σy = 300, Hardening: H = 200000

const YOUNG: f64 = 200_000.0;
const POISSON: f64 = 0.3;
const YIELD_STRESS: f64 = 300.0;
const HARDENING: f64 = 200_000.0;

fn run(constant: bool, acceleration: Option<&str>) -> Result<RunResults, StrError> {
    let mut config = Config::new();
    config.set_iter_max(200)?;
    if constant {
        config.set_stiffness_updating_policy(StiffnessUpdatingPolicy::ConstantStiffness);
    }
    let mut scheme = Scheme::new();
    scheme.set_config(config)?;
    let handle = BehaviourHandle::new("builtin", "", "VonMises", Hypothesis::Tridimensional);
    scheme.set_behaviour_from_handle(&handle)?;
    scheme
        .set_material_property("YoungModulus", Evolution::Constant(YOUNG))?
        .set_material_property("PoissonRatio", Evolution::Constant(POISSON))?
        .set_material_property("YieldStress", Evolution::Constant(YIELD_STRESS))?
        .set_material_property("HardeningSlope", Evolution::Constant(HARDENING))?
        .set_external_state_variable("Temperature", Evolution::Constant(293.15))?
        .impose_driving_variable("EXX", Evolution::new_linear(&[0.0, 1.0], &[0.0, 3e-3])?)?
        .set_times(&[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0])?;
    if let Some(name) = acceleration {
        scheme.set_acceleration_algorithm(name)?;
        scheme.set_acceleration_parameter("AccelerationTrigger", "4")?;
    }
    scheme.run()
}

#[test]
fn test_constant_stiffness_matches_newton_raphson() -> Result<(), StrError> {
    let reference = run(false, None)?;
    let constant = run(true, None)?;
    assert!(reference.succeeded());
    assert!(constant.succeeded());
    let (a, b) = (reference.series("SXX")?, constant.series("SXX")?);
    for k in 0..a.len() {
        approx_eq(a[k], b[k], 1e-2);
    }
    let last = reference.last().ok_or("results should not be empty")?;
    let last_constant = constant.last().ok_or("results should not be empty")?;
    assert!(last_constant.iterations > last.iterations);
    Ok(())
}

#[test]
fn test_accelerated_iterations_match_newton_raphson() -> Result<(), StrError> {
    let reference = run(false, None)?;
    let sxx = reference.series("SXX")?;
    for name in ["Cast3M", "IronsTuck", "Steffensen"] {
        let accelerated = run(true, Some(name))?;
        assert!(accelerated.succeeded());
        let b = accelerated.series("SXX")?;
        for k in 0..sxx.len() {
            approx_eq(sxx[k], b[k], 1e-2);
        }
    }
    Ok(())
}
