//! Value objects for the registration domain.

use serde::{Deserialize, Serialize};

use crate::capacity::Rejection;

/// Number of attendees covered by one registration: the registrant plus guests.
///
/// Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct PartySize(u32);

impl PartySize {
    /// Party size used when the caller does not specify one.
    pub const DEFAULT: PartySize = PartySize(1);

    /// Creates a party size, returning `None` for zero.
    pub fn new(size: u32) -> Option<Self> {
        (size > 0).then_some(Self(size))
    }

    /// Returns the number of attendees.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns the number of guests accompanying the registrant.
    pub fn guests(&self) -> u32 {
        self.0 - 1
    }
}

impl Default for PartySize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for PartySize {
    type Error = Rejection;

    fn try_from(requested: i64) -> Result<Self, Self::Error> {
        u32::try_from(requested)
            .ok()
            .and_then(PartySize::new)
            .ok_or(Rejection::InvalidPartySize { requested })
    }
}

impl From<PartySize> for u32 {
    fn from(size: PartySize) -> Self {
        size.0
    }
}

impl std::fmt::Display for PartySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attendee language preference as an ISO 639-1 code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Creates a locale from a language code. Not validated here.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the language code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attendee-supplied contact data.
///
/// Carried through the store untouched; the accounting core never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub language: Locale,
}

impl Contact {
    /// Creates a contact with only a display name and the default locale.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            language: Locale::default(),
        }
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the language preference.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Locale::new(language);
        self
    }

    /// Returns the name shown in attendee listings.
    pub fn display_name(&self) -> &str {
        self.name.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_size_rejects_zero_and_negative() {
        assert_eq!(
            PartySize::try_from(0),
            Err(Rejection::InvalidPartySize { requested: 0 })
        );
        assert_eq!(
            PartySize::try_from(-3),
            Err(Rejection::InvalidPartySize { requested: -3 })
        );
        assert!(PartySize::new(0).is_none());
    }

    #[test]
    fn party_size_rejects_values_beyond_u32() {
        let requested = i64::from(u32::MAX) + 1;
        assert_eq!(
            PartySize::try_from(requested),
            Err(Rejection::InvalidPartySize { requested })
        );
    }

    #[test]
    fn party_size_guests() {
        assert_eq!(PartySize::DEFAULT.guests(), 0);
        assert_eq!(PartySize::try_from(4).unwrap().guests(), 3);
    }

    #[test]
    fn party_size_deserialization_validates() {
        let size: PartySize = serde_json::from_str("3").unwrap();
        assert_eq!(size.get(), 3);
        assert!(serde_json::from_str::<PartySize>("0").is_err());
        assert!(serde_json::from_str::<PartySize>("-1").is_err());
    }

    #[test]
    fn contact_defaults_to_english() {
        let contact: Contact = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
        assert_eq!(contact.language.as_str(), "en");
        assert!(contact.email.is_none());
    }

    #[test]
    fn contact_builder() {
        let contact = Contact::named("  Ann ")
            .with_email("ann@example.org")
            .with_language("fi");
        assert_eq!(contact.display_name(), "Ann");
        assert_eq!(contact.email.as_deref(), Some("ann@example.org"));
        assert_eq!(contact.language, Locale::new("fi"));
    }
}
