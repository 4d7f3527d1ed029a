//! matpoint -- Material point driver for testing constitutive behaviours
//!
//! A single material point is driven along prescribed evolutions of its driving variables
//! (strain or deformation gradient) and thermodynamic forces (stress). Each step is solved
//! by Newton-Raphson iterations with Lagrange multipliers enforcing the imposed values.
//!
//! # Example
//!
//! ```
//! use matpoint::prelude::*;
//! use matpoint::StrError;
//!
//! fn main() -> Result<(), StrError> {
//!     // uniaxial tension of a von Mises material under plane strain
//!     let mut scheme = Scheme::new();
//!     let handle = BehaviourHandle::new("builtin", "", "VonMises", Hypothesis::PlaneStrain);
//!     scheme.set_behaviour_from_handle(&handle)?;
//!     scheme
//!         .set_material_property("YoungModulus", Evolution::Constant(200e3))?
//!         .set_material_property("PoissonRatio", Evolution::Constant(0.3))?
//!         .set_material_property("YieldStress", Evolution::Constant(300.0))?
//!         .set_material_property("HardeningSlope", Evolution::Constant(1e3))?
//!         .set_external_state_variable("Temperature", Evolution::Constant(293.15))?
//!         .impose_driving_variable("EXX", Evolution::new_linear(&[0.0, 1.0], &[0.0, 5e-3])?)?
//!         .set_times(&[0.0, 0.25, 0.5, 0.75, 1.0])?;
//!     let results = scheme.run()?;
//!     assert!(results.succeeded());
//!     Ok(())
//! }
//! ```

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod driver;
pub mod material;
pub mod prelude;
pub mod util;
