use std::fmt;
use std::ops::Range;

use blockworld::Block;
use blockworld::line::MAX_BLOCKS;

#[derive(Debug, Clone, PartialEq)]
pub enum ArmError {
    InvalidBlockCount(usize),
    UnknownBlock(Block),
    InvariantViolation(String),
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmError::InvalidBlockCount(n) => write!(
                f,
                "invalid block count {}: must be between 1 and {}",
                n,
                MAX_BLOCKS - 1
            ),
            ArmError::UnknownBlock(b) => write!(f, "unknown block: {}", b),
            ArmError::InvariantViolation(msg) => write!(f, "table invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for ArmError {}

/// An engine error or warning enriched with source location information.
#[derive(Debug)]
pub struct DiagnosticError {
    pub error: ArmError,
    /// Set for warnings, which carry their own text.
    pub message: Option<String>,
    pub span: Option<Range<usize>>,
    pub source_id: usize,
    pub is_warning: bool,
}

impl DiagnosticError {
    /// Create a warning diagnostic with a source span.
    pub fn warning(message: String, error: ArmError, span: Range<usize>, source_id: usize) -> Self {
        DiagnosticError {
            error,
            message: Some(message),
            span: Some(span),
            source_id,
            is_warning: true,
        }
    }
}

impl From<ArmError> for DiagnosticError {
    fn from(error: ArmError) -> Self {
        DiagnosticError {
            error,
            message: None,
            span: None,
            source_id: 0,
            is_warning: false,
        }
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({})", message, self.error),
            None => self.error.fmt(f),
        }
    }
}

impl std::error::Error for DiagnosticError {}
