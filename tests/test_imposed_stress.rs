use matpoint::prelude::*;
use matpoint::StrError;
use russell_lab::approx_eq;

// Linear elasticity under imposed uniaxial stress
//
// TEST GOAL
//
// Verifies the Lagrange multiplier formulation: the imposed stress is reached within
// the stress tolerance, the multiplier equals the imposed stress, and the lateral
// strains follow from the free (zero stress) components.
//
// LOADING
//
// * SXX increases linearly from 0 to 150 and then decreases to -50
//
// CONFIGURATION AND PARAMETERS
//
// * PlaneStress, NoPrediction, consistent tangent operator
// * Young: E = 2000, Poisson: ν = 0.2
//
// ANALYTICAL SOLUTION
//
// εxx = σ / E and εyy = εzz = -ν σ / E

const YOUNG: f64 = 2000.0;
const POISSON: f64 = 0.2;

#[test]
fn test_imposed_stress() -> Result<(), StrError> {
    // scheme
    let mut scheme = Scheme::new();
    let handle = BehaviourHandle::new("builtin", "", "LinearElastic", Hypothesis::PlaneStress);
    scheme.set_behaviour_from_handle(&handle)?;
    scheme
        .set_material_property("YoungModulus", Evolution::Constant(YOUNG))?
        .set_material_property("PoissonRatio", Evolution::Constant(POISSON))?
        .set_external_state_variable("Temperature", Evolution::Constant(293.15))?
        .set_evolution("reference", Evolution::new_linear(&[0.0, 1.0, 2.0], &[0.0, 150.0, -50.0])?)?
        .impose_thermodynamic_force("SXX", Evolution::new_linear(&[0.0, 1.0, 2.0], &[0.0, 150.0, -50.0])?)?
        .add_check("SXX", "reference", 1e-3)?
        .set_times(&[0.0, 0.5, 1.0, 1.5, 2.0])?;

    // run
    let results = scheme.run()?;
    assert!(results.succeeded());
    assert!(results.checks_passed());

    // check
    let sxx = results.series("SXX")?;
    let exx = results.series("EXX")?;
    let eyy = results.series("EYY")?;
    let ezz = results.series("EZZ")?;
    let syy = results.series("SYY")?;
    let szz = results.series("SZZ")?;
    for (k, snapshot) in results.snapshots.iter().enumerate() {
        let sigma = if snapshot.time <= 1.0 {
            150.0 * snapshot.time
        } else {
            150.0 - 200.0 * (snapshot.time - 1.0)
        };
        approx_eq(sxx[k], sigma, 1e-3);
        approx_eq(exx[k], sigma / YOUNG, 1e-9);
        approx_eq(eyy[k], -POISSON * sigma / YOUNG, 1e-9);
        approx_eq(ezz[k], -POISSON * sigma / YOUNG, 1e-9);
        approx_eq(syy[k], 0.0, 1e-3);
        approx_eq(szz[k], 0.0, 1e-3);
        approx_eq(snapshot.multipliers[0], sigma, 1e-3);
    }
    Ok(())
}
