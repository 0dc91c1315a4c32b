use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    /// A resource name did not match the expected grammar.
    #[error("malformed resource name: {0}")]
    Format(String),

    /// A search result or payload carried a variant we do not handle.
    #[error("unexpected type: {0}")]
    Type(String),

    /// A payload failed cross-field validation.
    #[error("invalid payload: {0}")]
    Validation(String),
}
