use matpoint::prelude::*;
use matpoint::StrError;
use russell_lab::approx_eq;

// von Mises plasticity under uniaxial stress
//
// TEST GOAL
//
// Verifies the Newton-Raphson iterations with the consistent tangent operator
// along an elastoplastic path with free lateral surfaces.
//
// LOADING
//
// * EXX increases linearly from 0 to 5e-3 within 10 periods
// * all stress components but SXX are zero
//
// CONFIGURATION AND PARAMETERS
//
// * Tridimensional, NoPrediction, ConsistentTangentOperator
// * Young: E = 200000, Poisson: ν = 0.3
// * Yield stress: σy = 300, Hardening: H = 10000
//
// ANALYTICAL SOLUTION
//
// Elastic: σ = E ε
// Plastic: σ = σy + Et (ε - σy / E) with Et = E H / (E + H) and p = ε - σ / E

const YOUNG: f64 = 200_000.0;
const POISSON: f64 = 0.3;
const YIELD_STRESS: f64 = 300.0;
const HARDENING: f64 = 10_000.0;
const STRAIN: f64 = 5e-3;
const N_PERIODS: usize = 10;

#[test]
fn test_von_mises_uniaxial() -> Result<(), StrError> {
    // scheme
    let mut scheme = Scheme::new();
    let handle = BehaviourHandle::new("builtin", "", "VonMises", Hypothesis::Tridimensional);
    scheme.set_behaviour_from_handle(&handle)?;
    let times: Vec<_> = (0..=N_PERIODS).map(|i| (i as f64) / (N_PERIODS as f64)).collect();
    scheme
        .set_material_property("YoungModulus", Evolution::Constant(YOUNG))?
        .set_material_property("PoissonRatio", Evolution::Constant(POISSON))?
        .set_material_property("YieldStress", Evolution::Constant(YIELD_STRESS))?
        .set_material_property("HardeningSlope", Evolution::Constant(HARDENING))?
        .set_external_state_variable("Temperature", Evolution::Constant(293.15))?
        .impose_driving_variable("EXX", Evolution::new_linear(&[0.0, 1.0], &[0.0, STRAIN])?)?
        .set_times(&times)?;

    // run
    let results = scheme.run()?;
    assert!(results.succeeded());
    assert_eq!(results.snapshots.len(), N_PERIODS + 1);

    // check
    let et = YOUNG * HARDENING / (YOUNG + HARDENING);
    let eps_y = YIELD_STRESS / YOUNG;
    let sxx = results.series("SXX")?;
    let syy = results.series("SYY")?;
    let p = results.series("EquivalentPlasticStrain")?;
    for (k, snapshot) in results.snapshots.iter().enumerate() {
        let eps = STRAIN * snapshot.time;
        let sigma = if eps <= eps_y {
            YOUNG * eps
        } else {
            YIELD_STRESS + et * (eps - eps_y)
        };
        approx_eq(sxx[k], sigma, 1e-6);
        approx_eq(syy[k], 0.0, 1e-6);
        approx_eq(p[k], eps - sigma / YOUNG, 1e-10);
        assert!(snapshot.iterations <= 10);
    }
    Ok(())
}
