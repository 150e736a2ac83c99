use thiserror::Error;

/// Errors from parsing CMDB identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A tree key segment is not `ci_id%type_id%meta`.
    #[error("invalid tree key segment: {0}")]
    InvalidTreeKeySegment(String),

    /// A CI id inside a tree key is not an integer.
    #[error("invalid CI id in tree key segment: {0}")]
    InvalidCiId(String),

    /// A type id inside a tree key is not an integer.
    #[error("invalid type id in tree key segment: {0}")]
    InvalidTypeId(String),
}
