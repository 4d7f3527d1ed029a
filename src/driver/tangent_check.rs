use super::{CurrentState, WorkSpace};
use crate::base::{Config, StiffnessMatrixType};
use crate::material::{Behaviour, Rotation};
use crate::StrError;

/// Compares the tangent operator in `ws.kt` with a central difference approximation
///
/// Every driving variable is perturbed by `±pv` (see `Config::perturbation`) and the
/// approximation is stored in `ws.nkt`. The end-of-step values of the state are restored.
///
/// Returns a warning if the largest deviation exceeds `Config::comparison_criterion` or
/// if a perturbed integration fails; otherwise returns None.
pub fn compare_to_numerical_tangent(
    behaviour: &mut dyn Behaviour,
    state: &mut CurrentState,
    ws: &mut WorkSpace,
    rotation: &Rotation,
    dt: f64,
    config: &Config,
) -> Result<Option<String>, StrError> {
    let ndv = state.n_driving_variables();
    let nth = state.s1.dim();
    let pv = config.perturbation();
    ws.u_save.as_mut_data().copy_from_slice(state.u1.as_data());
    ws.s_save.as_mut_data().copy_from_slice(state.s1.as_data());
    ws.iv_save.as_mut_data().copy_from_slice(state.iv1.as_data());

    let mut failed = false;
    for j in 0..ndv {
        state.u1[j] = ws.u_save[j] + pv;
        if !behaviour.integrate(&mut ws.tkt, state, rotation, dt, StiffnessMatrixType::NoStiffness)? {
            failed = true;
            break;
        }
        ws.s_plus.as_mut_data().copy_from_slice(state.s1.as_data());
        state.u1[j] = ws.u_save[j] - pv;
        if !behaviour.integrate(&mut ws.tkt, state, rotation, dt, StiffnessMatrixType::NoStiffness)? {
            failed = true;
            break;
        }
        for i in 0..nth {
            ws.nkt.set(i, j, (ws.s_plus[i] - state.s1[i]) / (2.0 * pv));
        }
        state.u1[j] = ws.u_save[j];
    }

    // restore
    state.u1.as_mut_data().copy_from_slice(ws.u_save.as_data());
    state.s1.as_mut_data().copy_from_slice(ws.s_save.as_data());
    state.iv1.as_mut_data().copy_from_slice(ws.iv_save.as_data());
    if failed {
        let message = "the computation of the numerical tangent operator failed".to_string();
        println!("WARNING: {}", message);
        return Ok(Some(message));
    }

    // compare
    let mut max_error = 0.0;
    let (mut i_max, mut j_max) = (0, 0);
    for i in 0..nth {
        for j in 0..ndv {
            let error = f64::abs(ws.kt.get(i, j) - ws.nkt.get(i, j));
            if error > max_error {
                max_error = error;
                (i_max, j_max) = (i, j);
            }
        }
    }
    if max_error > config.comparison_criterion() {
        let message = format!(
            "the tangent operator deviates from the numerical one by {:.6e} at ({}, {}): {:.6e} vs {:.6e}",
            max_error,
            i_max,
            j_max,
            ws.kt.get(i_max, j_max),
            ws.nkt.get(i_max, j_max)
        );
        println!("WARNING: {}", message);
        return Ok(Some(message));
    }
    Ok(None)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
