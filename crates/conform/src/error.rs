use conform_path::PathError;
use conform_value::ValueError;
use thiserror::Error;

use crate::config::ConfigError;

/// Fatal errors: malformed names, protocol mismatches and bad setup.
///
/// Validation failures are not errors; they travel as
/// [`FormError`](crate::FormError) data.
#[derive(Debug, Error)]
pub enum ConformError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("no registered intent accepts {0:?}")]
    UnknownIntent(String),
    #[error("unknown list operation {0:?}")]
    UnknownListOperation(String),
    #[error("{0:?} does not hold a list")]
    NotAList(String),
    #[error("invalid submission state: {0}")]
    InvalidState(#[source] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
