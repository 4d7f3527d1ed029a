//! Implements the material point driver: state, constraints, step solver, sub-stepping and time integration

mod acceleration;
mod check;
mod constraint;
mod control_convergence;
mod current_state;
mod run_results;
mod scheme;
mod step_solver;
mod sub_stepping;
mod tangent_check;
mod work_space;
pub use crate::driver::acceleration::*;
pub use crate::driver::check::*;
pub use crate::driver::constraint::*;
pub use crate::driver::control_convergence::*;
pub use crate::driver::current_state::*;
pub use crate::driver::run_results::*;
pub use crate::driver::scheme::*;
pub use crate::driver::step_solver::*;
pub use crate::driver::sub_stepping::*;
pub use crate::driver::tangent_check::*;
pub use crate::driver::work_space::*;
