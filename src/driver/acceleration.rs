use crate::StrError;
use russell_lab::{vec_add, vec_copy, vec_inner, vec_norm, vec_scale, vec_update, Norm, Vector};

/// Defines the interface of the convergence accelerators
///
/// The history is shifted at every non-converged iteration (see `record`) and the
/// extrapolation is applied when `iter ≥ trigger` and `(iter - trigger) % period == 0`.
/// The history lives in scratch vectors owned by the work space.
pub trait AccelerationAlgorithm: Send {
    /// Returns the name of the algorithm
    fn name(&self) -> &'static str;

    /// Returns the number of scratch vectors (each with the size of the unknown vector)
    fn n_scratch(&self) -> usize;

    /// Sets a parameter
    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError>;

    /// Returns the cadence
    fn cadence(&self) -> &Cadence;

    /// Records the iterate and possibly replaces it by the extrapolated one
    ///
    /// # Input
    ///
    /// * `u1` -- unknowns after the Newton-Raphson correction; replaced if the extrapolation is applied
    /// * `u_eval` -- unknowns at which the residual was evaluated
    /// * `r` -- residual at `u_eval`
    /// * `iter` -- iteration number (starting at 1)
    /// * `seps` -- thermodynamic force epsilon
    /// * `scratch` -- scratch vectors
    ///
    /// Returns true if `u1` has been replaced.
    fn execute(
        &self,
        u1: &mut Vector,
        u_eval: &Vector,
        r: &Vector,
        iter: usize,
        seps: f64,
        scratch: &mut [Vector],
    ) -> Result<bool, StrError>;
}

/// Holds the parameters controlling when the extrapolation is applied
#[derive(Clone, Copy, Debug)]
pub struct Cadence {
    /// First iteration at which the extrapolation may be applied (≥ 3)
    pub trigger: usize,

    /// Number of iterations between two extrapolations (≥ 1)
    pub period: usize,
}

impl Cadence {
    /// Allocates a new instance with the default values (trigger = 3, period = 2)
    pub fn new() -> Self {
        Cadence { trigger: 3, period: 2 }
    }

    /// Sets a parameter
    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        let value: usize = value.trim().parse().map_err(|_| "the acceleration parameter must be an integer")?;
        match key {
            "AccelerationTrigger" => {
                if value < 3 {
                    return Err("AccelerationTrigger must be ≥ 3");
                }
                self.trigger = value;
            }
            "AccelerationPeriod" => {
                if value < 1 {
                    return Err("AccelerationPeriod must be ≥ 1");
                }
                self.period = value;
            }
            _ => return Err("unknown acceleration parameter"),
        }
        Ok(())
    }

    /// Returns true if the extrapolation must be applied at this iteration
    pub fn active(&self, iter: usize) -> bool {
        iter >= self.trigger && (iter - self.trigger) % self.period == 0
    }
}

/// Allocates an acceleration algorithm given its name
///
/// Names: `Cast3M`, `IronsTuck` and `Steffensen`.
pub fn new_acceleration_algorithm(name: &str) -> Result<Box<dyn AccelerationAlgorithm>, StrError> {
    match name {
        "Cast3M" => Ok(Box::new(Cast3M { cadence: Cadence::new() })),
        "IronsTuck" => Ok(Box::new(IronsTuck { cadence: Cadence::new() })),
        "Steffensen" => Ok(Box::new(Steffensen { cadence: Cadence::new() })),
        _ => Err("unknown acceleration algorithm"),
    }
}

/// Shifts the history stored in `scratch[first..first + 3]` and copies `v` into the last slot
fn shift(scratch: &mut [Vector], first: usize, v: &Vector) -> Result<(), StrError> {
    scratch.swap(first, first + 1);
    scratch.swap(first + 1, first + 2);
    vec_copy(&mut scratch[first + 2], v)
}

/// Implements the Cast3M acceleration (projection of the residuals on the plane of the last three)
///
/// With the iterates `u0, u1, u2` and residuals `r0, r1, r2`, the new estimate
/// `u = u0 + α (u1 - u0) + β (u2 - u0)` minimizes the norm of the linear combination of the
/// residuals. The plane is spanned by the orthonormalized differences `r1 - r0` and `r2 - r0`.
/// If the two differences are (almost) collinear, the projection uses `r1 - r0` only.
///
/// Scratch: `u0 u1 u2 r0 r1 r2 n0 n1`.
pub struct Cast3M {
    cadence: Cadence,
}

impl AccelerationAlgorithm for Cast3M {
    fn name(&self) -> &'static str {
        "Cast3M"
    }

    fn n_scratch(&self) -> usize {
        8
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        self.cadence.set_parameter(key, value)
    }

    fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    fn execute(
        &self,
        u1: &mut Vector,
        u_eval: &Vector,
        r: &Vector,
        iter: usize,
        seps: f64,
        scratch: &mut [Vector],
    ) -> Result<bool, StrError> {
        shift(scratch, 0, u_eval)?;
        shift(scratch, 3, r)?;
        if !self.cadence.active(iter) {
            return Ok(false);
        }
        let ca_eps = 100.0 * seps * f64::EPSILON;
        let (history, basis) = scratch.split_at_mut(6);
        let (uu, rr) = history.split_at(3);
        let (n0, n1) = basis.split_at_mut(1);
        let (n0, n1) = (&mut n0[0], &mut n1[0]);

        // first direction
        vec_add(n0, 1.0, &rr[1], -1.0, &rr[0])?;
        let nr0 = vec_norm(n0, Norm::Euc);
        if nr0 < ca_eps {
            return Ok(false);
        }
        vec_scale(n0, 1.0 / nr0);
        let p0 = -vec_inner(&rr[0], n0);

        // second direction (orthogonalized)
        vec_add(n1, 1.0, &rr[2], -1.0, &rr[0])?;
        let ntmp1 = vec_inner(n1, n0);
        vec_update(n1, -ntmp1, n0)?;
        let nr1 = vec_norm(n1, Norm::Euc);
        let (alpha, beta) = if nr1 > 0.1 * f64::abs(ntmp1) && nr1 > ca_eps {
            vec_scale(n1, 1.0 / nr1);
            let p1 = -vec_inner(&rr[0], n1);
            let beta = p1 / nr1;
            ((p0 - beta * ntmp1) / nr0, beta)
        } else {
            (p0 / nr0, 0.0)
        };

        // u = (1 - α - β) u0 + α u1 + β u2
        vec_add(u1, 1.0 - alpha - beta, &uu[0], alpha, &uu[1])?;
        vec_update(u1, beta, &uu[2])?;
        Ok(true)
    }
}

/// Implements the Irons-Tuck acceleration (vector form of the Aitken Δ² process)
///
/// With the corrected iterates `x0, x1, x2`:
///
/// ```text
/// Δ1 = x1 - x0
/// Δ2 = x2 - x1
/// x* = x2 - (Δ2·(Δ2 - Δ1) / |Δ2 - Δ1|²) Δ2
/// ```
///
/// Scratch: `x0 x1 x2 Δ2 Δ2-Δ1`.
pub struct IronsTuck {
    cadence: Cadence,
}

impl AccelerationAlgorithm for IronsTuck {
    fn name(&self) -> &'static str {
        "IronsTuck"
    }

    fn n_scratch(&self) -> usize {
        5
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        self.cadence.set_parameter(key, value)
    }

    fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    fn execute(
        &self,
        u1: &mut Vector,
        _u_eval: &Vector,
        _r: &Vector,
        iter: usize,
        _seps: f64,
        scratch: &mut [Vector],
    ) -> Result<bool, StrError> {
        shift(scratch, 0, u1)?;
        if !self.cadence.active(iter) {
            return Ok(false);
        }
        let (xx, work) = scratch.split_at_mut(3);
        let (d2, dd) = work.split_at_mut(1);
        let (d2, dd) = (&mut d2[0], &mut dd[0]);
        vec_add(d2, 1.0, &xx[2], -1.0, &xx[1])?;
        vec_add(dd, 1.0, d2, 1.0, &xx[0])?;
        vec_update(dd, -1.0, &xx[1])?;
        let den = vec_inner(dd, dd);
        if den <= f64::MIN_POSITIVE {
            return Ok(false);
        }
        let c = vec_inner(d2, dd) / den;
        vec_add(u1, 1.0, &xx[2], -c, d2)?;
        Ok(true)
    }
}

/// Implements the Steffensen acceleration (componentwise Aitken Δ² process)
///
/// ```text
/// x*_i = x0_i - (x1_i - x0_i)² / (x2_i - 2 x1_i + x0_i)
/// ```
///
/// Components with a vanishing denominator keep the last iterate.
///
/// Scratch: `x0 x1 x2`.
pub struct Steffensen {
    cadence: Cadence,
}

impl AccelerationAlgorithm for Steffensen {
    fn name(&self) -> &'static str {
        "Steffensen"
    }

    fn n_scratch(&self) -> usize {
        3
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        self.cadence.set_parameter(key, value)
    }

    fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    fn execute(
        &self,
        u1: &mut Vector,
        _u_eval: &Vector,
        _r: &Vector,
        iter: usize,
        _seps: f64,
        scratch: &mut [Vector],
    ) -> Result<bool, StrError> {
        shift(scratch, 0, u1)?;
        if !self.cadence.active(iter) {
            return Ok(false);
        }
        let (x0, x1, x2) = (scratch[0].as_data(), scratch[1].as_data(), scratch[2].as_data());
        for i in 0..x0.len() {
            let den = x2[i] - 2.0 * x1[i] + x0[i];
            if f64::abs(den) > f64::MIN_POSITIVE {
                u1[i] = x0[i] - (x1[i] - x0[i]) * (x1[i] - x0[i]) / den;
            }
        }
        Ok(true)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
