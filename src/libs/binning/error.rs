use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum BinError {
    /// A scoring weight was negative or not finite
    InvalidWeights(String),
    /// Any other rejected setting (thresholds, role universe, bounds)
    InvalidConfig(String),
    /// Error while parsing one of the tab-delimited exchange files
    Parse {
        /// File name, or a short label for in-memory input
        file: String,
        /// The line number (1-based)
        line: usize,
        /// A human-readable message explaining the error
        message: String,
    },
    /// A clustering or fitness evaluation failed internally
    Evaluation(String),
}

impl BinError {
    pub fn parse(file: &str, line: usize, message: impl Into<String>) -> Self {
        BinError::Parse {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for BinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinError::InvalidWeights(msg) => write!(f, "Invalid score weights: {}", msg),
            BinError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            BinError::Parse {
                file,
                line,
                message,
            } => write!(f, "Parse error in {} at line {}: {}", file, line, message),
            BinError::Evaluation(msg) => write!(f, "Evaluation failed: {}", msg),
        }
    }
}

impl std::error::Error for BinError {}
