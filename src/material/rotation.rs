use super::{BehaviourDescription, BehaviourType, SymmetryType};
use crate::StrError;
use russell_lab::{mat_copy, mat_mat_mul, mat_t_mat_mul, mat_vec_mul, vec_copy, vec_mat_mul, Matrix, Vector};
use std::f64::consts::SQRT_2;

/// Holds the tolerance used to check that a frame is orthonormal
const FRAME_TOLERANCE: f64 = 100.0 * f64::EPSILON;

/// Holds the (i,j) indices of the symmetric tensor components in Mandel order
const STENSOR_INDICES: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];

/// Defines the direction of a frame change
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    GlobalToMaterial,
    MaterialToGlobal,
}

/// Maps driving variables, thermodynamic forces and operators between the global and material frames
///
/// The frame is a 3×3 orthonormal matrix whose columns are the material axes expressed
/// in the global frame. The strategy is resolved once from the behaviour description:
///
/// * isotropic behaviours: identity (no work at all)
/// * orthotropic small strain behaviours: Mandel rotation of symmetric tensors
/// * orthotropic cohesive zone behaviours: rotation of vectors
pub struct Rotation {
    /// Frame (3 × 3)
    frame: Matrix,

    /// Operator P such that v_material = P v_global (None for the identity)
    forward: Option<Matrix>,
}

impl Rotation {
    /// Allocates the identity rotation
    pub fn identity() -> Self {
        Rotation {
            frame: Matrix::diagonal(&[1.0, 1.0, 1.0]),
            forward: None,
        }
    }

    /// Allocates the rotation suited to a behaviour
    pub fn new(frame: &Matrix, description: &BehaviourDescription) -> Result<Self, StrError> {
        check_frame(frame)?;
        if description.symmetry == SymmetryType::Isotropic {
            let mut rotation = Rotation::identity();
            mat_copy(&mut rotation.frame, frame)?;
            return Ok(rotation);
        }
        let n = description.n_driving_variables();
        match description.btype {
            BehaviourType::SmallStrain => Rotation::new_stensor(frame, n),
            BehaviourType::CohesiveZone => Rotation::new_vector(frame, n),
            BehaviourType::FiniteStrain => Err("rotation of orthotropic finite strain behaviours is not available"),
            BehaviourType::General => Err("rotation of orthotropic general behaviours is not available"),
        }
    }

    /// Allocates a rotation of symmetric tensors with n components (3, 4 or 6)
    pub fn new_stensor(frame: &Matrix, n: usize) -> Result<Self, StrError> {
        check_frame(frame)?;
        if n != 3 && n != 4 && n != 6 {
            return Err("the number of symmetric tensor components must be 3, 4 or 6");
        }
        let r = frame;
        let mut p = Matrix::new(n, n);
        for row in 0..n {
            let (a, b) = STENSOR_INDICES[row];
            for col in 0..n {
                let (i, j) = STENSOR_INDICES[col];
                let value = match (a == b, i == j) {
                    (true, true) => r.get(i, a) * r.get(i, a),
                    (true, false) => SQRT_2 * r.get(i, a) * r.get(j, a),
                    (false, true) => SQRT_2 * r.get(i, a) * r.get(i, b),
                    (false, false) => r.get(i, a) * r.get(j, b) + r.get(j, a) * r.get(i, b),
                };
                p.set(row, col, value);
            }
        }
        check_orthogonal(&p, "the frame must keep the out-of-plane axis for this hypothesis")?;
        let mut rotation = Rotation::identity();
        mat_copy(&mut rotation.frame, frame)?;
        rotation.forward = Some(p);
        Ok(rotation)
    }

    /// Allocates a rotation of vectors with n components (1, 2 or 3)
    pub fn new_vector(frame: &Matrix, n: usize) -> Result<Self, StrError> {
        check_frame(frame)?;
        if n < 1 || n > 3 {
            return Err("the number of vector components must be 1, 2 or 3");
        }
        let mut p = Matrix::new(n, n);
        for a in 0..n {
            for i in 0..n {
                p.set(a, i, frame.get(i, a)); // P = Rᵀ
            }
        }
        check_orthogonal(&p, "the frame must keep the out-of-plane axis for this hypothesis")?;
        let mut rotation = Rotation::identity();
        mat_copy(&mut rotation.frame, frame)?;
        rotation.forward = Some(p);
        Ok(rotation)
    }

    /// Indicates that no frame change is performed
    pub fn is_identity(&self) -> bool {
        self.forward.is_none()
    }

    /// Returns the frame (3 × 3)
    pub fn frame(&self) -> &Matrix {
        &self.frame
    }

    /// Rotates a vector of components
    ///
    /// ```text
    /// GlobalToMaterial: dst = P src
    /// MaterialToGlobal: dst = Pᵀ src
    /// ```
    pub fn rotate(&self, dst: &mut Vector, src: &Vector, direction: Direction) -> Result<(), StrError> {
        match &self.forward {
            None => vec_copy(dst, src),
            Some(p) => match direction {
                Direction::GlobalToMaterial => mat_vec_mul(dst, 1.0, p, src),
                Direction::MaterialToGlobal => vec_mat_mul(dst, 1.0, src, p),
            },
        }
    }

    /// Rotates a vector of components in place
    pub fn rotate_in_place(&self, v: &mut Vector, direction: Direction) -> Result<(), StrError> {
        if self.forward.is_some() {
            let src = v.clone();
            self.rotate(v, &src, direction)?;
        }
        Ok(())
    }

    /// Converts an operator computed in the material frame into the global frame
    ///
    /// ```text
    /// K_global = Pᵀ K_material P
    /// ```
    pub fn rotate_stiffness(&self, kt: &mut Matrix) -> Result<(), StrError> {
        if let Some(p) = &self.forward {
            let (n, _) = p.dims();
            let mut kp = Matrix::new(n, n);
            mat_mat_mul(&mut kp, 1.0, kt, p, 0.0)?;
            mat_t_mat_mul(kt, 1.0, p, &kp, 0.0)?;
        }
        Ok(())
    }
}

/// Checks that a 3×3 frame is made of normalised and orthogonal columns
pub fn check_frame(frame: &Matrix) -> Result<(), StrError> {
    if frame.dims() != (3, 3) {
        return Err("the frame must be a 3×3 matrix");
    }
    let mut rtr = Matrix::new(3, 3);
    mat_t_mat_mul(&mut rtr, 1.0, frame, frame, 0.0)?;
    for a in 0..3 {
        if f64::abs(rtr.get(a, a) - 1.0) > FRAME_TOLERANCE {
            return Err("the columns of the frame must be normalised");
        }
    }
    for a in 0..3 {
        for b in (a + 1)..3 {
            if f64::abs(rtr.get(a, b)) > FRAME_TOLERANCE {
                return Err("the columns of the frame must be orthogonal");
            }
        }
    }
    Ok(())
}

/// Checks that PᵀP = I
fn check_orthogonal(p: &Matrix, message: StrError) -> Result<(), StrError> {
    let (n, _) = p.dims();
    let mut ptp = Matrix::new(n, n);
    mat_t_mat_mul(&mut ptp, 1.0, p, p, 0.0)?;
    for i in 0..n {
        for j in 0..n {
            let expected = if i == j { 1.0 } else { 0.0 };
            if f64::abs(ptp.get(i, j) - expected) > 1e3 * FRAME_TOLERANCE {
                return Err(message);
            }
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
