use thiserror::Error;

/// Error types for the eisfit-rs library.
#[derive(Error, Debug)]
pub enum EisError {
    /// Fewer usable observations than free parameters; no fit is attempted.
    #[error("Insufficient data: {observations} observations for {parameters} free parameters")]
    InsufficientData {
        observations: usize,
        parameters: usize,
    },

    /// Singular Jacobian, vanishing parallel sum or non-finite intermediate values.
    #[error("Numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A circuit model identifier that is not part of the model library.
    #[error("Unknown circuit model: {0}")]
    UnknownModel(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type alias for eisfit-rs operations.
pub type Result<T> = std::result::Result<T, EisError>;
