use matpoint::driver::CurrentState;
use matpoint::material::{BehaviourDescription, BehaviourType, Rotation};
use matpoint::prelude::*;
use matpoint::StrError;
use russell_lab::{approx_eq, Matrix};

// Recovery of rejected steps by halving the time increment
//
// TEST GOAL
//
// Verifies that a behaviour rejecting large time increments is integrated with
// smaller sub-steps covering each period exactly, and that an exhausted sub-step
// budget is reported as a failure keeping the committed periods.
//
// BEHAVIOUR
//
// A one-dimensional linear spring (s = k u on the RR, ZZ and TT components)
// rejecting every time increment larger than 0.3.
//
// LOADING
//
// * ERR increases linearly from 0 to 0.01 within t ∈ [0, 2]

const STIFFNESS: f64 = 100.0;
const DT_MAX: f64 = 0.3;

struct Spring {
    description: BehaviourDescription,
}

impl Spring {
    fn new() -> Self {
        let mut description = BehaviourDescription::new(
            BehaviourType::SmallStrain,
            Hypothesis::AxisymmetricalGeneralisedPlaneStrain,
        );
        description.material_properties = vec!["Stiffness".to_string()];
        Spring { description }
    }
}

impl Behaviour for Spring {
    fn description(&self) -> &BehaviourDescription {
        &self.description
    }

    fn compute_prediction_operator(
        &mut self,
        kt: &mut Matrix,
        state: &CurrentState,
        _rotation: &Rotation,
        _ktype: StiffnessMatrixType,
    ) -> Result<bool, StrError> {
        for i in 0..3 {
            kt.set(i, i, state.mprops1[0]);
        }
        Ok(true)
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        state: &mut CurrentState,
        _rotation: &Rotation,
        dt: f64,
        ktype: StiffnessMatrixType,
    ) -> Result<bool, StrError> {
        if dt > DT_MAX {
            return Ok(false);
        }
        for i in 0..3 {
            state.s1[i] = state.mprops1[0] * state.u1[i];
            if ktype != StiffnessMatrixType::NoStiffness {
                kt.set(i, i, state.mprops1[0]);
            }
        }
        Ok(true)
    }
}

fn new_scheme(m_sub_steps: usize) -> Result<Scheme, StrError> {
    let mut config = Config::new();
    config.set_m_sub_steps(m_sub_steps);
    let mut scheme = Scheme::new();
    scheme.set_config(config)?;
    scheme.set_behaviour(Box::new(Spring::new()))?;
    scheme
        .set_material_property("Stiffness", Evolution::Constant(STIFFNESS))?
        .set_external_state_variable("Temperature", Evolution::Constant(293.15))?
        .impose_driving_variable("ERR", Evolution::new_linear(&[0.0, 2.0], &[0.0, 0.01])?)?
        .set_times(&[0.0, 0.25, 1.0, 2.0])?;
    Ok(scheme)
}

#[test]
fn test_sub_stepping_recovers_the_steps() -> Result<(), StrError> {
    let mut scheme = new_scheme(10)?;
    let results = scheme.run()?;
    assert!(results.succeeded());
    assert_eq!(results.times(), &[0.0, 0.25, 1.0, 2.0]);

    // 0.25 is accepted; 0.75 needs 0.375 (rejected) then 0.1875 × 4; 1.0 needs 0.25 × 4
    let sub_steps: Vec<_> = results.snapshots.iter().map(|s| s.sub_steps).collect();
    assert_eq!(sub_steps, &[0, 1, 4, 4]);

    // the sub-steps end exactly at the requested times
    for snapshot in &results.snapshots {
        let eps = 0.005 * snapshot.time;
        approx_eq(snapshot.driving_variables[0], eps, 1e-15);
        approx_eq(snapshot.thermodynamic_forces[0], STIFFNESS * eps, 1e-12);
        approx_eq(snapshot.driving_variables[1], 0.0, 1e-15);
    }
    Ok(())
}

#[test]
fn test_sub_stepping_exhausts_the_budget() -> Result<(), StrError> {
    let mut scheme = new_scheme(1)?;
    let results = scheme.run()?;
    assert!(!results.succeeded());

    // the first period is committed; the second needs two halvings
    assert_eq!(results.snapshots.len(), 2);
    let failure = results.failure.as_ref().ok_or("the failure should be reported")?;
    assert_eq!(failure.period, 1);
    assert_eq!(failure.time, 0.25);
    assert_eq!(failure.category, FailureCategory::LocalIntegration);
    assert_eq!(failure.message, "the maximum number of sub-steps has been reached");
    Ok(())
}
