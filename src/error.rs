use thiserror::Error;

/// Error types for the sansfit-rs library.
#[derive(Error, Debug)]
pub enum SansError {
    /// Parallel data arrays have different lengths.
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A smearing adapter was given both a kernel and a parameter map.
    #[error("Invalid adapter construction: {0}")]
    InvalidAdapterConstruction(String),

    /// A smearing adapter was built from a kernel of the wrong kind.
    #[error("Adapter type mismatch: expected {expected} kernel, got {found}")]
    AdapterTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// No points survive Q filtering.
    #[error("No usable data: {0}")]
    NoUsableData(String),

    /// Model identifier with no registered kernel.
    #[error("Unknown model id: {0}")]
    UnknownModel(i64),

    /// Smearing selection identifier outside 0..=3.
    #[error("Unknown smearing id: {0}")]
    UnknownSmearing(i64),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Error for invalid parameter values.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Error indicating the algorithm failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for sansfit-rs operations.
pub type Result<T> = std::result::Result<T, SansError>;

impl From<String> for SansError {
    fn from(s: String) -> Self {
        SansError::Other(s)
    }
}

impl From<&str> for SansError {
    fn from(s: &str) -> Self {
        SansError::Other(s.to_string())
    }
}
