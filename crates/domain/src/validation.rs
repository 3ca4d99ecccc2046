//! Shape validation for creation payloads.
//!
//! Runs before capacity accounting. A payload that fails here never reaches
//! the store.

use crate::error::ValidationError;
use crate::registration::{Contact, Locale};

/// Maximum length of a contact name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of an email address, in characters.
pub const MAX_EMAIL_LENGTH: usize = 254;

impl Contact {
    /// Checks the contact fields the registration flow relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        let length = name.chars().count();
        if length > MAX_NAME_LENGTH {
            return Err(ValidationError::NameTooLong {
                length,
                max: MAX_NAME_LENGTH,
            });
        }

        if let Some(email) = &self.email {
            validate_email(email)?;
        }

        self.language.validate()
    }
}

impl Locale {
    /// Accepts two lowercase ASCII letters, e.g. `en` or `fi`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let code = self.as_str();
        if code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase()) {
            Ok(())
        } else {
            Err(ValidationError::InvalidLocale(code.to_string()))
        }
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    if email.chars().count() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}
