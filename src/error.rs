use thiserror::Error;

/// Errors raised by the document model.
///
/// Every failure is synchronous and fail-fast: an operation that returns an
/// error has not mutated the model. Multi-step edits (row/column insertion and
/// deletion) validate every bound before applying anything.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Malformed reference text or an out-of-range coordinate.
    #[error("invalid cell reference: {0}")]
    InvalidCellReference(String),

    /// An argument with a bad shape (empty hyperlink target, a named range
    /// that collides with a cell-reference pattern, an overlapping merge, …).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reading an optional property that is not set.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// A named range, style, or sheet lookup missed.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Empty, too long, illegal character, or duplicate sheet title.
    #[error("invalid sheet title: {0}")]
    InvalidSheetTitle(String),

    /// A disallowed control character in a string value.
    #[error("illegal character {0:#04x} in string value")]
    IllegalCharacter(u32),

    /// A structural edit would exceed the worksheet axis limits.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
}
