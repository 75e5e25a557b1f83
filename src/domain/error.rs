//! Domain error types.

/// Top-level error type for sigbench.
#[derive(Debug, thiserror::Error)]
pub enum SigbenchError {
    #[error("missing column: {column}")]
    MissingColumn { column: String },

    #[error("empty series: {reason}")]
    EmptySeries { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("computation error: {reason}")]
    Computation { reason: String },

    #[error("invalid signal in {column} at index {index}: {value}")]
    InvalidSignal {
        column: String,
        index: usize,
        value: f64,
    },

    #[error("timestamps not strictly increasing at bar {index}")]
    UnorderedTimestamps { index: usize },

    #[error("model {model} returned {actual} predictions for {expected} rows")]
    ModelOutput {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("refusing to overwrite existing output {path}")]
    OutputExists { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigbenchError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        SigbenchError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn empty_series(reason: impl Into<String>) -> Self {
        SigbenchError::EmptySeries {
            reason: reason.into(),
        }
    }

    pub fn missing_column(column: &str) -> Self {
        SigbenchError::MissingColumn {
            column: column.to_string(),
        }
    }

    /// Process exit status for this error family.
    pub fn exit_code(&self) -> u8 {
        match self {
            SigbenchError::Io(_) | SigbenchError::OutputExists { .. } => 1,
            SigbenchError::ConfigParse { .. }
            | SigbenchError::ConfigMissing { .. }
            | SigbenchError::ConfigInvalid { .. } => 2,
            SigbenchError::Data { .. }
            | SigbenchError::UnorderedTimestamps { .. }
            | SigbenchError::InvalidSignal { .. } => 3,
            SigbenchError::InvalidParameter { .. } => 4,
            SigbenchError::MissingColumn { .. } | SigbenchError::EmptySeries { .. } => 5,
            SigbenchError::Computation { .. } | SigbenchError::ModelOutput { .. } => 6,
        }
    }
}

impl From<csv::Error> for SigbenchError {
    fn from(err: csv::Error) -> Self {
        SigbenchError::Data {
            reason: format!("CSV error: {err}"),
        }
    }
}

impl From<&SigbenchError> for std::process::ExitCode {
    fn from(err: &SigbenchError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
