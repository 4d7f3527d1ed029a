//! Implements the input and output utilities (JSON scheme files and plots)

mod plot;
mod scheme_input;
pub use crate::util::plot::*;
pub use crate::util::scheme_input::*;
