use crate::material::BehaviourDescription;
use russell_lab::Vector;

/// Holds the mechanical state of the material point
///
/// Values are stored for the previous step (`_1`), the beginning of the current step (`0`)
/// and the end of the current step (`1`). The end-of-step values are the trial values
/// updated by the Newton-Raphson iterations.
///
/// The unknown vectors `u_1`, `u0` and `u1` hold the driving variables followed by one
/// Lagrange multiplier per imposed thermodynamic force (declaration order).
///
/// All lengths are fixed at allocation and never change.
#[derive(Clone, Debug)]
pub struct CurrentState {
    /// Unknowns at the end of the previous step
    pub u_1: Vector,

    /// Unknowns at the beginning of the step
    pub u0: Vector,

    /// Unknowns at the end of the step (trial)
    pub u1: Vector,

    /// Thermodynamic forces at the end of the previous step
    pub s_1: Vector,

    /// Thermodynamic forces at the beginning of the step
    pub s0: Vector,

    /// Thermodynamic forces at the end of the step
    pub s1: Vector,

    /// Thermal strain at the beginning of the step
    pub e_th0: Vector,

    /// Thermal strain at the end of the step
    pub e_th1: Vector,

    /// Internal state variables at the end of the previous step
    pub iv_1: Vector,

    /// Internal state variables at the beginning of the step
    pub iv0: Vector,

    /// Internal state variables at the end of the step
    pub iv1: Vector,

    /// Material properties at the end of the step
    pub mprops1: Vector,

    /// External state variables at the beginning of the step (the temperature comes first)
    pub esv0: Vector,

    /// Increments of the external state variables
    pub desv: Vector,

    /// Number of completed periods
    pub period: usize,

    /// Previous time increment (zero before the first converged step)
    pub dt_1: f64,

    /// Reference temperature of the thermal expansion
    pub tref: f64,

    /// Number of driving variables
    ndv: usize,
}

impl CurrentState {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `description` -- gives the number of each kind of variable
    /// * `n_lagrange` -- number of Lagrange multipliers (imposed thermodynamic forces)
    pub fn new(description: &BehaviourDescription, n_lagrange: usize) -> Self {
        let ndv = description.n_driving_variables();
        let nth = description.n_thermodynamic_forces();
        let niv = description.n_internal_state_variables();
        let nmp = description.material_properties.len();
        let nesv = description.external_state_variables.len();
        let psz = ndv + n_lagrange;
        CurrentState {
            u_1: Vector::new(psz),
            u0: Vector::new(psz),
            u1: Vector::new(psz),
            s_1: Vector::new(nth),
            s0: Vector::new(nth),
            s1: Vector::new(nth),
            e_th0: Vector::new(ndv),
            e_th1: Vector::new(ndv),
            iv_1: Vector::new(niv),
            iv0: Vector::new(niv),
            iv1: Vector::new(niv),
            mprops1: Vector::new(nmp),
            esv0: Vector::new(nesv),
            desv: Vector::new(nesv),
            period: 0,
            dt_1: 0.0,
            tref: 0.0,
            ndv,
        }
    }

    /// Returns the number of driving variables
    pub fn n_driving_variables(&self) -> usize {
        self.ndv
    }

    /// Returns the number of unknowns (driving variables and Lagrange multipliers)
    pub fn n_unknowns(&self) -> usize {
        self.u1.dim()
    }

    /// Returns the end-of-step driving variables
    pub fn driving_variables(&self) -> &[f64] {
        &self.u1.as_data()[..self.ndv]
    }

    /// Returns the end-of-step Lagrange multipliers
    pub fn multipliers(&self) -> &[f64] {
        &self.u1.as_data()[self.ndv..]
    }

    /// Returns the increment of the i-th driving variable minus the thermal strain increment
    pub fn mechanical_increment(&self, i: usize) -> f64 {
        self.u1[i] - self.u0[i] - (self.e_th1[i] - self.e_th0[i])
    }

    /// Resets the end-of-step values to the beginning-of-step values
    pub fn revert(&mut self) {
        copy(&mut self.u1, &self.u0);
        copy(&mut self.s1, &self.s0);
        copy(&mut self.iv1, &self.iv0);
        copy(&mut self.e_th1, &self.e_th0);
    }

    /// Commits a converged step: the end-of-step values become the next beginning-of-step values
    pub fn commit(&mut self, dt: f64) {
        copy(&mut self.u_1, &self.u0);
        copy(&mut self.u0, &self.u1);
        copy(&mut self.s_1, &self.s0);
        copy(&mut self.s0, &self.s1);
        copy(&mut self.iv_1, &self.iv0);
        copy(&mut self.iv0, &self.iv1);
        copy(&mut self.e_th0, &self.e_th1);
        for i in 0..self.esv0.dim() {
            self.esv0[i] += self.desv[i];
            self.desv[i] = 0.0;
        }
        self.dt_1 = dt;
    }
}

/// Copies vectors with the same length
fn copy(dst: &mut Vector, src: &Vector) {
    dst.as_mut_data().copy_from_slice(src.as_data());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
