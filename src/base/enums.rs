use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the strategy used to guess the unknowns before the Newton-Raphson iterations
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PredictionPolicy {
    /// Starts from the state at the beginning of the step
    ///
    /// **Note:** at least two iterations are then required before convergence can be declared.
    NoPrediction,

    /// Extrapolates linearly from the previous step: `u1 = u0 + (u0 - u_1) Δt / Δt_1`
    LinearPrediction,

    /// Solves the linearized problem with the elastic operator returned by the behaviour
    ElasticPrediction,

    /// Solves the linearized problem with the isotropic Hooke operator built from the material properties
    ElasticPredictionFromMaterialProperties,

    /// Solves the linearized problem with the secant operator returned by the behaviour
    SecantOperatorPrediction,

    /// Solves the linearized problem with the tangent operator returned by the behaviour
    TangentOperatorPrediction,
}

/// Defines the kind of operator requested from the behaviour
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum StiffnessMatrixType {
    NoStiffness,
    Elastic,
    SecantOperator,
    TangentOperator,
    ConsistentTangentOperator,
}

/// Defines how often the Jacobian is recomputed across iterations
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum StiffnessUpdatingPolicy {
    /// The prediction operator is computed once for the whole run
    ConstantStiffness,

    /// The prediction operator is computed at the beginning of every (sub)step
    ConstantStiffnessByPeriod,

    /// The operator returned by every integration is used
    UpdatedStiffnessMatrix,
}

/// Defines what a behaviour does when a variable leaves its bounds
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum OutOfBoundsPolicy {
    None,
    Warning,
    Strict,
}

/// Defines the category of a failed step
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum FailureCategory {
    /// The behaviour rejected the integration (local non-convergence or strict bounds)
    LocalIntegration,

    /// The Jacobian of the global system was singular
    NumericalSingularity,

    /// The Newton-Raphson iterations were exhausted (or produced NaN/Inf)
    GlobalConvergence,
}

impl PredictionPolicy {
    /// Returns the policy corresponding to a name
    pub fn from_name(name: &str) -> Result<Self, StrError> {
        match name {
            "NoPrediction" => Ok(PredictionPolicy::NoPrediction),
            "LinearPrediction" => Ok(PredictionPolicy::LinearPrediction),
            "ElasticPrediction" => Ok(PredictionPolicy::ElasticPrediction),
            "ElasticPredictionFromMaterialProperties" => Ok(PredictionPolicy::ElasticPredictionFromMaterialProperties),
            "SecantOperatorPrediction" => Ok(PredictionPolicy::SecantOperatorPrediction),
            "TangentOperatorPrediction" => Ok(PredictionPolicy::TangentOperatorPrediction),
            _ => Err("unknown prediction policy"),
        }
    }

    /// Returns the operator requested from the behaviour for the prediction
    ///
    /// Returns None if the policy does not use a behaviour-computed operator.
    pub fn operator(&self) -> Option<StiffnessMatrixType> {
        match self {
            PredictionPolicy::ElasticPrediction => Some(StiffnessMatrixType::Elastic),
            PredictionPolicy::SecantOperatorPrediction => Some(StiffnessMatrixType::SecantOperator),
            PredictionPolicy::TangentOperatorPrediction => Some(StiffnessMatrixType::TangentOperator),
            _ => None,
        }
    }
}

impl StiffnessMatrixType {
    /// Returns the integer code stored in the first entry of the operator buffer
    ///
    /// Prediction requests use the negated codes.
    pub fn code(&self, prediction: bool) -> f64 {
        let code = match self {
            StiffnessMatrixType::NoStiffness => 0.0,
            StiffnessMatrixType::Elastic => 1.0,
            StiffnessMatrixType::SecantOperator => 2.0,
            StiffnessMatrixType::TangentOperator => 3.0,
            StiffnessMatrixType::ConsistentTangentOperator => 4.0,
        };
        if prediction {
            -code
        } else {
            code
        }
    }
}

impl OutOfBoundsPolicy {
    /// Returns the integer code passed to the behaviour library
    pub fn code(&self) -> i32 {
        match self {
            OutOfBoundsPolicy::None => 0,
            OutOfBoundsPolicy::Warning => 1,
            OutOfBoundsPolicy::Strict => 2,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
