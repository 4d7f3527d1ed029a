use super::{Behaviour, LinearElastic, UmatBehaviour, VonMises};
use crate::base::{Hypothesis, OutOfBoundsPolicy};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Identifies a behaviour implementation
///
/// # Interfaces
///
/// * `umat` -- small strain function exported by a shared library (`library` is the path)
/// * `builtin` -- behaviour implemented in this crate (`function` is `LinearElastic`,
///   `ThermoElastic` or `VonMises`; `library` is ignored)
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BehaviourHandle {
    /// Interface name
    pub interface: String,

    /// Path to the shared library
    pub library: String,

    /// Name of the function
    pub function: String,

    /// Modelling hypothesis
    pub hypothesis: Hypothesis,
}

impl BehaviourHandle {
    /// Allocates a new instance
    pub fn new(interface: &str, library: &str, function: &str, hypothesis: Hypothesis) -> Self {
        BehaviourHandle {
            interface: interface.to_string(),
            library: library.to_string(),
            function: function.to_string(),
            hypothesis,
        }
    }

    /// Checks that the handle is well formed
    pub fn validate(&self) -> Result<(), StrError> {
        if self.function.is_empty() {
            return Err("the behaviour function name is empty");
        }
        match self.interface.as_str() {
            "umat" => {
                if self.library.is_empty() {
                    return Err("the behaviour library path is empty");
                }
                Ok(())
            }
            "builtin" => Ok(()),
            _ => Err("unknown behaviour interface"),
        }
    }

    /// Loads the behaviour
    ///
    /// The out-of-bounds policy is handed to the implementation at construction.
    pub fn load(&self, policy: OutOfBoundsPolicy) -> Result<Box<dyn Behaviour>, StrError> {
        self.validate()?;
        match self.interface.as_str() {
            "umat" => Ok(Box::new(UmatBehaviour::new(self, policy)?)),
            _ => match self.function.as_str() {
                "LinearElastic" => Ok(Box::new(LinearElastic::new(self.hypothesis, false)?)),
                "ThermoElastic" => Ok(Box::new(LinearElastic::new(self.hypothesis, true)?)),
                "VonMises" => Ok(Box::new(VonMises::new(self.hypothesis)?)),
                _ => Err("unknown built-in behaviour"),
            },
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
