//! Implements the base structures for a material point test

mod config;
mod enums;
mod evolution;
mod hypothesis;
pub use crate::base::config::*;
pub use crate::base::enums::*;
pub use crate::base::evolution::*;
pub use crate::base::hypothesis::*;
