//! Implements the behaviour contract, the behaviour adapters and the rotation module

mod behaviour;
mod handle;
mod linear_elastic;
mod rotation;
mod umat;
mod von_mises;
pub use crate::material::behaviour::*;
pub use crate::material::handle::*;
pub use crate::material::linear_elastic::*;
pub use crate::material::rotation::*;
pub use crate::material::umat::*;
pub use crate::material::von_mises::*;
