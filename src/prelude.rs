//! Makes available common structures needed to run a material point test
//!
//! You may write `use matpoint::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Config, Evolution, FailureCategory, Hypothesis, OutOfBoundsPolicy, PredictionPolicy};
pub use crate::base::{StiffnessMatrixType, StiffnessUpdatingPolicy};
pub use crate::driver::{RunResults, Scheme};
pub use crate::material::{Behaviour, BehaviourHandle};
pub use crate::util::{ResultsPlotter, SchemeInput};
