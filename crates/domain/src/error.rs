//! Domain error types.

use thiserror::Error;

/// A creation payload failed shape validation.
///
/// Raised before the capacity accountant is consulted, so it never
/// coincides with a capacity rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Contact name is empty or whitespace.
    #[error("Contact name is required")]
    NameRequired,

    /// Contact name exceeds the maximum length.
    #[error("Contact name is too long: {length} characters (max {max})")]
    NameTooLong { length: usize, max: usize },

    /// Email address is not plausibly formed.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Language preference is not a two-letter lowercase code.
    #[error("Invalid language code: {0}")]
    InvalidLocale(String),
}
