use thiserror::Error;

/// Errors raised while constructing grids, fields and models.
///
/// Every variant is fatal to the model being built; callers re-run
/// construction with corrected inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Malformed grid parameters (dimension mismatch, non-positive spacing or shape)
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Raw data does not match the declared interior shape
    #[error("shape mismatch for '{field}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        field: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// An externally supplied grid disagrees with the locally derived one
    #[error("grid mismatch: {0}")]
    GridMismatch(String),

    /// A primary field needed by a derivation step (or the model itself) was never supplied
    #[error("missing parameter '{parameter}' required by {required_by}")]
    MissingParameter {
        parameter: String,
        required_by: String,
    },

    /// Reassignment would switch a field between uniform and spatially-varying storage
    #[error("field '{field}' is {existing} and cannot be reassigned a {requested} value")]
    RepresentationMismatch {
        field: String,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
