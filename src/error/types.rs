use thiserror::Error;

use crate::hash::HashKey;

/// Unified result type for the floatmenu crate.
pub type Result<T> = std::result::Result<T, SelectError>;

/// Errors surfaced by the select engine.
///
/// Every variant is a programmer error: it indicates a caller bug and is
/// reported synchronously rather than absorbed. Binding validity failures
/// (multi-select bound to a non-sequence) and close-during-open races are
/// handled internally and never appear here.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("option with key `{0}` is already registered")]
    DuplicateOption(HashKey),
    #[error("overlay target is not resolved")]
    MissingTarget,
    #[error("overlay is already open")]
    AlreadyOpen,
    #[error("option declared without a value source")]
    MissingValueSource,
}
