use super::CurrentState;
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Holds the numeric buffers of one run
///
/// The buffers are allocated once by `Scheme::initialize_work_space` and indexed (never
/// reallocated) by the step solver at every iteration.
pub struct WorkSpace {
    /// Jacobian of the global system (psz × psz); overwritten by the factorization
    pub kk: Matrix,

    /// Residual of the global system (psz)
    pub rr: Vector,

    /// Correction of the unknowns (psz)
    pub du: Vector,

    /// Tangent operator returned by the behaviour (nth × ndv)
    pub kt: Matrix,

    /// Prediction operator; also the operator of the constant stiffness policies (nth × ndv)
    pub kp: Matrix,

    /// Indicates that `kp` holds the operator of the constant stiffness policies
    pub kp_ready: bool,

    /// Numerical tangent operator (nth × ndv)
    pub nkt: Matrix,

    /// Discarded operator of the perturbed integrations (nth × ndv)
    pub tkt: Matrix,

    /// Unknowns at which the residual was evaluated (psz)
    pub u_eval: Vector,

    /// Saved unknowns of the numerical tangent computation (psz)
    pub u_save: Vector,

    /// Saved thermodynamic forces (nth)
    pub s_save: Vector,

    /// Saved internal state variables (niv)
    pub iv_save: Vector,

    /// Thermodynamic forces of the forward perturbation (nth)
    pub s_plus: Vector,

    /// Mechanical increment of the driving variables used by the prediction (ndv)
    pub de: Vector,

    /// Linearized thermodynamic forces of the prediction (nth)
    pub s_lin: Vector,

    /// Scratch vectors of the acceleration algorithm (each of size psz)
    pub acc: Vec<Vector>,

    /// Normalisation factor of the imposed driving variable rows (first assembly of the run)
    pub normalisation: Option<f64>,

    /// Warnings produced during the last step
    pub warnings: Vec<String>,
}

impl WorkSpace {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `state` -- gives the dimensions
    /// * `n_acceleration` -- number of scratch vectors required by the acceleration algorithm
    pub fn new(state: &CurrentState, n_acceleration: usize) -> Self {
        let ndv = state.n_driving_variables();
        let psz = state.n_unknowns();
        let nth = state.s1.dim();
        let niv = state.iv1.dim();
        WorkSpace {
            kk: Matrix::new(psz, psz),
            rr: Vector::new(psz),
            du: Vector::new(psz),
            kt: Matrix::new(nth, ndv),
            kp: Matrix::new(nth, ndv),
            kp_ready: false,
            nkt: Matrix::new(nth, ndv),
            tkt: Matrix::new(nth, ndv),
            u_eval: Vector::new(psz),
            u_save: Vector::new(psz),
            s_save: Vector::new(nth),
            iv_save: Vector::new(niv),
            s_plus: Vector::new(nth),
            de: Vector::new(ndv),
            s_lin: Vector::new(nth),
            acc: (0..n_acceleration).map(|_| Vector::new(psz)).collect(),
            normalisation: None,
            warnings: Vec::new(),
        }
    }

    /// Checks that the buffers match the dimensions of the state
    pub fn check(&self, state: &CurrentState) -> Result<(), StrError> {
        let psz = state.n_unknowns();
        let ndv = state.n_driving_variables();
        let nth = state.s1.dim();
        if self.kk.dims() != (psz, psz) || self.rr.dim() != psz || self.du.dim() != psz {
            return Err("the work space does not match the number of unknowns");
        }
        if self.kt.dims() != (nth, ndv) || self.s_save.dim() != nth || self.iv_save.dim() != state.iv1.dim() {
            return Err("the work space does not match the behaviour variables");
        }
        if self.acc.iter().any(|v| v.dim() != psz) {
            return Err("the acceleration scratch does not match the number of unknowns");
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
