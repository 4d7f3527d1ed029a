use super::{Behaviour, BehaviourDescription, BehaviourType, Rotation, SymmetryType};
use crate::base::{Hypothesis, StiffnessMatrixType};
use crate::driver::CurrentState;
use crate::StrError;
use russell_lab::{mat_copy, mat_vec_mul_update, vec_copy, Matrix, Vector};
use russell_tensor::LinElasticity;

/// Maps the symmetric tensor components (XX YY ZZ XY XZ YZ) to the Mandel order of russell_tensor (XX YY ZZ XY YZ XZ)
pub(crate) const TO_RUSSELL: [usize; 6] = [0, 1, 2, 3, 5, 4];

/// Computes the isotropic Hooke operator with n components (3, 4 or 6) in the Mandel basis
///
/// The operator is the three-dimensional one restricted to the first n components; plane stress
/// is enforced by the driver through a zero out-of-plane stress.
pub fn hooke_operator(dd: &mut Matrix, young: f64, poisson: f64) -> Result<(), StrError> {
    if young <= 0.0 {
        return Err("Young's modulus must be > 0.0");
    }
    if poisson <= -1.0 || poisson >= 0.5 {
        return Err("Poisson's coefficient must be in (-1.0, 0.5)");
    }
    let (n, m) = dd.dims();
    if n != m || (n != 3 && n != 4 && n != 6) {
        return Err("the elastic operator must be 3×3, 4×4 or 6×6");
    }
    let model = LinElasticity::new(young, poisson, false, false);
    let full = model.get_modulus().matrix();
    for i in 0..n {
        for j in 0..n {
            dd.set(i, j, full.get(TO_RUSSELL[i], TO_RUSSELL[j]));
        }
    }
    Ok(())
}

/// Implements a linear elastic small strain behaviour
///
/// Material properties: `YoungModulus`, `PoissonRatio` and, for the thermo-elastic
/// variant, `ThermalExpansion` (isotropic coefficient applied to the temperature increment).
pub struct LinearElastic {
    description: BehaviourDescription,
    thermal_expansion: bool,
    dd: Matrix,

    /// Mechanical strain increment
    de: Vector,
}

impl LinearElastic {
    /// Allocates a new instance
    pub fn new(hypothesis: Hypothesis, thermal_expansion: bool) -> Result<Self, StrError> {
        let mut description = BehaviourDescription::new(BehaviourType::SmallStrain, hypothesis);
        description.material_properties = vec!["YoungModulus".to_string(), "PoissonRatio".to_string()];
        if thermal_expansion {
            description.material_properties.push("ThermalExpansion".to_string());
        }
        description.reentrant = true;
        let n = description.n_driving_variables();
        Ok(LinearElastic {
            description,
            thermal_expansion,
            dd: Matrix::new(n, n),
            de: Vector::new(n),
        })
    }

    /// Sets the declared symmetry
    ///
    /// The isotropic operator is invariant under rotation; thus, an orthotropic declaration
    /// only enables the material frame.
    pub fn set_symmetry(&mut self, symmetry: SymmetryType) -> &mut Self {
        self.description.symmetry = symmetry;
        self
    }

    /// Computes the elastic operator from the current material properties
    fn update_operator(&mut self, state: &CurrentState) -> Result<(), StrError> {
        hooke_operator(&mut self.dd, state.mprops1[0], state.mprops1[1])
    }
}

impl Behaviour for LinearElastic {
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
        self.update_operator(state)?;
        mat_copy(kt, &self.dd)?;
        Ok(true)
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        state: &mut CurrentState,
        _rotation: &Rotation,
        _dt: f64,
        ktype: StiffnessMatrixType,
    ) -> Result<bool, StrError> {
        self.update_operator(state)?;
        let n = self.description.n_driving_variables();
        let dtheta = if self.thermal_expansion {
            state.mprops1[2] * state.desv[0]
        } else {
            0.0
        };

        // σ1 = σ0 + D : (Δε - Δε_th)
        for i in 0..n {
            self.de[i] = state.mechanical_increment(i);
            if i < 3 {
                self.de[i] -= dtheta;
            }
        }
        vec_copy(&mut state.s1, &state.s0)?;
        mat_vec_mul_update(&mut state.s1, 1.0, &self.dd, &self.de, 1.0)?;
        if ktype != StiffnessMatrixType::NoStiffness {
            mat_copy(kt, &self.dd)?;
        }
        Ok(true)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
