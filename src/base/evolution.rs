use crate::StrError;
use std::collections::HashMap;
use std::fmt;

/// Defines a scalar function of time
pub enum Evolution {
    /// Constant value
    Constant(f64),

    /// Piecewise linear interpolation through (time, value) pairs
    ///
    /// Values are clamped outside the range of times.
    LinearInterpolation { times: Vec<f64>, values: Vec<f64> },

    /// Arbitrary function of time
    Function(Box<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Evolution {
    /// Allocates a piecewise linear evolution
    ///
    /// The times must be strictly increasing.
    pub fn new_linear(times: &[f64], values: &[f64]) -> Result<Self, StrError> {
        if times.is_empty() {
            return Err("linear evolution requires at least one point");
        }
        if times.len() != values.len() {
            return Err("linear evolution requires the same number of times and values");
        }
        for i in 1..times.len() {
            if times[i] <= times[i - 1] {
                return Err("linear evolution requires strictly increasing times");
            }
        }
        Ok(Evolution::LinearInterpolation {
            times: times.to_vec(),
            values: values.to_vec(),
        })
    }

    /// Allocates an evolution from a closure
    pub fn new_function<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Evolution::Function(Box::new(f))
    }

    /// Evaluates the evolution at time t
    pub fn value(&self, t: f64) -> f64 {
        match self {
            Evolution::Constant(v) => *v,
            Evolution::LinearInterpolation { times, values } => {
                let n = times.len();
                if t <= times[0] {
                    return values[0];
                }
                if t >= times[n - 1] {
                    return values[n - 1];
                }
                // first abscissa strictly larger than t (exists because t < times[n-1])
                let k = times.partition_point(|&x| x <= t);
                let (t0, t1) = (times[k - 1], times[k]);
                let (v0, v1) = (values[k - 1], values[k]);
                v0 + (v1 - v0) * (t - t0) / (t1 - t0)
            }
            Evolution::Function(f) => f(t),
        }
    }

    /// Indicates whether the evolution does not depend on time
    pub fn is_constant(&self) -> bool {
        match self {
            Evolution::Constant(..) => true,
            Evolution::LinearInterpolation { values, .. } => values.iter().all(|v| *v == values[0]),
            Evolution::Function(..) => false,
        }
    }
}

impl fmt::Debug for Evolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evolution::Constant(v) => write!(f, "Constant({:?})", v),
            Evolution::LinearInterpolation { times, values } => {
                write!(f, "LinearInterpolation {{ times: {:?}, values: {:?} }}", times, values)
            }
            Evolution::Function(..) => write!(f, "Function"),
        }
    }
}

/// Holds the evolutions of a test, keyed by name
///
/// Material properties, external state variables, imposed values and checks refer to
/// evolutions by name. The registry is locked when the scheme completes its
/// initialisation; afterwards it is read-only.
#[derive(Debug)]
pub struct EvolutionManager {
    evolutions: HashMap<String, Evolution>,
    locked: bool,
}

impl EvolutionManager {
    /// Allocates a new (empty, unlocked) instance
    pub fn new() -> Self {
        EvolutionManager {
            evolutions: HashMap::new(),
            locked: false,
        }
    }

    /// Inserts (or replaces) an evolution
    pub fn insert(&mut self, name: &str, evolution: Evolution) -> Result<(), StrError> {
        if self.locked {
            return Err("evolutions cannot be modified after the initialisation is complete");
        }
        self.evolutions.insert(name.to_string(), evolution);
        Ok(())
    }

    /// Replaces the value of a constant evolution (or creates it)
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), StrError> {
        self.insert(name, Evolution::Constant(value))
    }

    /// Locks the registry
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Indicates whether the registry is locked
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Indicates whether an evolution exists
    pub fn contains(&self, name: &str) -> bool {
        self.evolutions.contains_key(name)
    }

    /// Returns an evolution
    pub fn get(&self, name: &str) -> Result<&Evolution, StrError> {
        self.evolutions.get(name).ok_or("evolution is not defined")
    }

    /// Evaluates an evolution at time t
    pub fn value(&self, name: &str, t: f64) -> Result<f64, StrError> {
        Ok(self.get(name)?.value(t))
    }

    /// Indicates whether an evolution does not depend on time
    pub fn is_constant(&self, name: &str) -> Result<bool, StrError> {
        Ok(self.get(name)?.is_constant())
    }

    /// Returns the sorted names of all evolutions
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.evolutions.keys().cloned().collect();
        names.sort();
        names
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
