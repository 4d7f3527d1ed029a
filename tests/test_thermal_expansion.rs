use matpoint::prelude::*;
use matpoint::StrError;
use russell_lab::approx_eq;

// Thermal expansion computed by the driver
//
// TEST GOAL
//
// Verifies that the thermal strain α (T - Tref) - α (T0 - Tref) is removed from the
// strain seen by the behaviour.
//
// LOADING
//
// * T increases linearly from 293.15 to 393.15
// * Case 1: free expansion (all stress components are zero)
// * Case 2: blocked expansion (all strain components are zero)
//
// CONFIGURATION AND PARAMETERS
//
// * Tridimensional, LinearElastic
// * Young: E = 1000, Poisson: ν = 0.25, α = 1e-5
//
// ANALYTICAL SOLUTION
//
// Case 1: εxx = εyy = εzz = α ΔT
// Case 2: σxx = σyy = σzz = -E α ΔT / (1 - 2ν)

const YOUNG: f64 = 1000.0;
const POISSON: f64 = 0.25;
const ALPHA: f64 = 1e-5;
const DELTA_T: f64 = 100.0;

fn new_scheme(blocked: bool) -> Result<Scheme, StrError> {
    let mut scheme = Scheme::new();
    let handle = BehaviourHandle::new("builtin", "", "LinearElastic", Hypothesis::Tridimensional);
    scheme.set_behaviour_from_handle(&handle)?;
    scheme
        .set_material_property("YoungModulus", Evolution::Constant(YOUNG))?
        .set_material_property("PoissonRatio", Evolution::Constant(POISSON))?
        .set_evolution("ThermalExpansion", Evolution::Constant(ALPHA))?
        .set_external_state_variable(
            "Temperature",
            Evolution::new_linear(&[0.0, 1.0], &[293.15, 293.15 + DELTA_T])?,
        )?
        .set_times(&[0.0, 0.5, 1.0])?;
    if blocked {
        for component in ["EXX", "EYY", "EZZ", "EXY", "EXZ", "EYZ"] {
            scheme.impose_driving_variable(component, Evolution::Constant(0.0))?;
        }
    }
    Ok(scheme)
}

#[test]
fn test_thermal_expansion_free() -> Result<(), StrError> {
    let mut scheme = new_scheme(false)?;
    let results = scheme.run()?;
    assert!(results.succeeded());
    for snapshot in &results.snapshots {
        let eps = ALPHA * DELTA_T * snapshot.time;
        for i in 0..3 {
            approx_eq(snapshot.driving_variables[i], eps, 1e-12);
            approx_eq(snapshot.thermodynamic_forces[i], 0.0, 1e-6);
        }
        for i in 3..6 {
            approx_eq(snapshot.driving_variables[i], 0.0, 1e-12);
        }
    }
    Ok(())
}

#[test]
fn test_thermal_expansion_blocked() -> Result<(), StrError> {
    let mut scheme = new_scheme(true)?;
    let results = scheme.run()?;
    assert!(results.succeeded());
    for snapshot in &results.snapshots {
        let sigma = -YOUNG * ALPHA * DELTA_T * snapshot.time / (1.0 - 2.0 * POISSON);
        for i in 0..3 {
            approx_eq(snapshot.driving_variables[i], 0.0, 1e-15);
            approx_eq(snapshot.thermodynamic_forces[i], sigma, 1e-10);
        }
    }
    Ok(())
}
