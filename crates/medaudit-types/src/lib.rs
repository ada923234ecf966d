/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A normalized clinical specialty label.
///
/// Specialty labels drive the specialist routing of the audit queue, so they are
/// compared often and must compare predictably: construction trims the input and
/// uppercases it, which matches how the specialty catalog is maintained
/// (`ORTOPEDIA`, `NEUROCIRURGIA`, ...).
///
/// The label `GERAL` is a sentinel, not a real specialty: a request routed to
/// `GERAL` sits in the generalist triage pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specialty(String);

/// Sentinel label for the generalist triage pool.
pub const GENERAL_QUEUE: &str = "GERAL";

impl Specialty {
    /// Creates a new `Specialty` from the given input.
    ///
    /// The input is trimmed and uppercased. Empty or whitespace-only input is
    /// rejected.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// The `GERAL` sentinel routing a request back to the generalist pool.
    pub fn general() -> Self {
        Self(GENERAL_QUEUE.to_owned())
    }

    /// Whether this label is the `GERAL` sentinel.
    pub fn is_general(&self) -> bool {
        self.0 == GENERAL_QUEUE
    }

    /// Returns the normalized label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Specialty {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Specialty {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Specialty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Specialty::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  dr. silva ").unwrap().as_str(), "dr. silva");
        assert!(NonEmptyText::new("   ").is_err());
        assert!(NonEmptyText::new("").is_err());
    }

    #[test]
    fn specialty_normalizes_to_uppercase() {
        let s = Specialty::new(" ortopedia ").unwrap();
        assert_eq!(s.as_str(), "ORTOPEDIA");
        assert!(!s.is_general());
    }

    #[test]
    fn general_sentinel_round_trips() {
        let g = Specialty::general();
        assert!(g.is_general());
        assert_eq!(g, Specialty::new("geral").unwrap());
    }

    #[test]
    fn specialty_serde_uses_plain_string() {
        let s: Specialty = serde_json::from_str("\"cardiologia\"").unwrap();
        assert_eq!(s.as_str(), "CARDIOLOGIA");
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"CARDIOLOGIA\"");
    }
}
