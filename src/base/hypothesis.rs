use crate::StrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the modelling hypothesis (dimensional reduction of the material point)
///
/// The hypothesis fixes the number of components of symmetric tensors (strain, stress),
/// unsymmetric tensors (deformation gradient) and vectors (cohesive openings).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hypothesis {
    /// 1D axisymmetrical generalised plane strain (components RR, ZZ, TT)
    AxisymmetricalGeneralisedPlaneStrain,

    /// 2D axisymmetrical (components RR, ZZ, TT, RZ)
    Axisymmetrical,

    /// 2D plane stress
    PlaneStress,

    /// 2D plane strain
    PlaneStrain,

    /// 2D generalised plane strain
    GeneralisedPlaneStrain,

    /// 3D
    Tridimensional,
}

/// Holds the symmetric tensor component suffixes in cartesian coordinates
const CARTESIAN: [&str; 6] = ["XX", "YY", "ZZ", "XY", "XZ", "YZ"];

/// Holds the symmetric tensor component suffixes in axisymmetric coordinates
const AXISYMMETRIC: [&str; 4] = ["RR", "ZZ", "TT", "RZ"];

/// Holds the unsymmetric tensor component suffixes
const UNSYMMETRIC: [&str; 9] = ["XX", "YY", "ZZ", "XY", "YX", "XZ", "ZX", "YZ", "ZY"];

impl Hypothesis {
    /// Returns the hypothesis corresponding to a name
    pub fn from_name(name: &str) -> Result<Self, StrError> {
        match name {
            "AxisymmetricalGeneralisedPlaneStrain" => Ok(Hypothesis::AxisymmetricalGeneralisedPlaneStrain),
            "Axisymmetrical" => Ok(Hypothesis::Axisymmetrical),
            "PlaneStress" => Ok(Hypothesis::PlaneStress),
            "PlaneStrain" => Ok(Hypothesis::PlaneStrain),
            "GeneralisedPlaneStrain" => Ok(Hypothesis::GeneralisedPlaneStrain),
            "Tridimensional" => Ok(Hypothesis::Tridimensional),
            _ => Err("unknown modelling hypothesis"),
        }
    }

    /// Returns the space dimension
    pub fn space_dimension(&self) -> usize {
        match self {
            Hypothesis::AxisymmetricalGeneralisedPlaneStrain => 1,
            Hypothesis::Tridimensional => 3,
            _ => 2,
        }
    }

    /// Returns the number of components of a symmetric tensor
    pub fn stensor_size(&self) -> usize {
        match self.space_dimension() {
            1 => 3,
            2 => 4,
            _ => 6,
        }
    }

    /// Returns the number of components of an unsymmetric tensor
    pub fn tensor_size(&self) -> usize {
        match self.space_dimension() {
            1 => 3,
            2 => 5,
            _ => 9,
        }
    }

    /// Indicates an axisymmetric reduction (cylindrical components)
    pub fn axisymmetric(&self) -> bool {
        matches!(
            self,
            Hypothesis::Axisymmetrical | Hypothesis::AxisymmetricalGeneralisedPlaneStrain
        )
    }

    /// Returns the component suffixes of symmetric tensors
    pub fn stensor_components(&self) -> Vec<&'static str> {
        let n = self.stensor_size();
        if self.axisymmetric() {
            AXISYMMETRIC[0..n].to_vec()
        } else {
            CARTESIAN[0..n].to_vec()
        }
    }

    /// Returns the component suffixes of unsymmetric tensors
    pub fn tensor_components(&self) -> Vec<&'static str> {
        let n = self.tensor_size();
        if self.axisymmetric() {
            // same ordering, cylindrical labels
            ["RR", "ZZ", "TT", "RZ", "ZR"][0..n].to_vec()
        } else {
            UNSYMMETRIC[0..n].to_vec()
        }
    }

    /// Returns the code passed as `ndi` to the small strain behaviour functions
    pub fn umat_code(&self) -> i32 {
        match self {
            Hypothesis::AxisymmetricalGeneralisedPlaneStrain => 14,
            Hypothesis::Axisymmetrical => 0,
            Hypothesis::PlaneStress => -2,
            Hypothesis::PlaneStrain => -1,
            Hypothesis::GeneralisedPlaneStrain => -3,
            Hypothesis::Tridimensional => 2,
        }
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Hypothesis;

    #[test]
    fn from_name_works() {
        assert_eq!(Hypothesis::from_name("PlaneStrain").unwrap(), Hypothesis::PlaneStrain);
        assert_eq!(Hypothesis::from_name("Tridimensional").unwrap(), Hypothesis::Tridimensional);
        assert_eq!(Hypothesis::from_name("3D").err(), Some("unknown modelling hypothesis"));
    }

    #[test]
    fn sizes_work() {
        let h = Hypothesis::AxisymmetricalGeneralisedPlaneStrain;
        assert_eq!((h.space_dimension(), h.stensor_size(), h.tensor_size()), (1, 3, 3));
        let h = Hypothesis::PlaneStress;
        assert_eq!((h.space_dimension(), h.stensor_size(), h.tensor_size()), (2, 4, 5));
        let h = Hypothesis::Tridimensional;
        assert_eq!((h.space_dimension(), h.stensor_size(), h.tensor_size()), (3, 6, 9));
    }

    #[test]
    fn components_work() {
        assert_eq!(Hypothesis::PlaneStrain.stensor_components(), &["XX", "YY", "ZZ", "XY"]);
        assert_eq!(Hypothesis::Axisymmetrical.stensor_components(), &["RR", "ZZ", "TT", "RZ"]);
        assert_eq!(
            Hypothesis::Tridimensional.stensor_components(),
            &["XX", "YY", "ZZ", "XY", "XZ", "YZ"]
        );
        assert_eq!(Hypothesis::GeneralisedPlaneStrain.tensor_components().len(), 5);
    }

    #[test]
    fn umat_code_works() {
        assert_eq!(Hypothesis::Tridimensional.umat_code(), 2);
        assert_eq!(Hypothesis::PlaneStress.umat_code(), -2);
        assert_eq!(Hypothesis::AxisymmetricalGeneralisedPlaneStrain.umat_code(), 14);
        assert_eq!(format!("{}", Hypothesis::PlaneStrain), "PlaneStrain");
    }
}
