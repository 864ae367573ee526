use std::fmt;

/// Behavioral error categories for the IVF engine (spec §7). All fallible
/// APIs return `anyhow::Result<T>`; this enum is what gets wrapped at the
/// point of failure so callers can `downcast_ref::<IndexError>()` when they
/// need to branch on the kind rather than just log the message.
#[derive(Debug)]
pub enum IndexError {
    CapacityExceeded { detail: String },
    DimensionMismatch { expected: usize, actual: usize },
    NotBuilt,
    IoFailure { path: String, source: std::io::Error },
    MissingFile { path: String },
    InvalidFormat { detail: String },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::CapacityExceeded { detail } => {
                write!(f, "capacity exceeded: {}", detail)
            }
            IndexError::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}, got {}",
                expected, actual
            ),
            IndexError::NotBuilt => write!(f, "index has not been built"),
            IndexError::IoFailure { path, source } => {
                write!(f, "I/O failure on {}: {}", path, source)
            }
            IndexError::MissingFile { path } => write!(f, "missing file: {}", path),
            IndexError::InvalidFormat { detail } => write!(f, "invalid format: {}", detail),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::IoFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}
