//! @ai:module:intent Error types for record storage and comparison
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use crate::records::{Condition, Metric};
use thiserror::Error;

/// @ai:intent Unified error type for the comparison engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("No {condition} record for {target}/{metric}")]
    MissingRecord {
        condition: Condition,
        target: String,
        metric: Metric,
    },

    #[error("The {condition} record for {target}/{metric} has no value")]
    MissingValue {
        condition: Condition,
        target: String,
        metric: Metric,
    },

    #[error("Percentage undefined for {target}/{metric}: baseline value is zero")]
    DivisionUndefined { target: String, metric: Metric },

    #[error("Malformed input in {source_name}: field `{field}` {message}")]
    MalformedInput {
        source_name: String,
        field: String,
        message: String,
    },

    #[error("Unknown benchmark profile: {0}")]
    UnknownProfile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// @ai:intent True for the "no data" outcomes that mark a comparison incomplete
    /// @ai:effects pure
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::MissingRecord { .. } | Error::MissingValue { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
