use serde::{Deserialize, Serialize};

use clinic_core::{require_text, DomainError, ValueObject};

/// A doctor as written on appointments.
///
/// Doctors are free text. Two names denote the same doctor when they agree
/// after trimming and ignoring case; [`DoctorName::key`] is that comparison
/// form and is what stores index on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoctorName {
    display: String,
    key: String,
}

impl ValueObject for DoctorName {}

impl DoctorName {
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        require_text("doctor_name", raw)?;
        let display = raw.trim().to_string();
        let key = display.to_lowercase();
        Ok(Self { display, key })
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn matches(&self, other: &str) -> bool {
        other.trim().to_lowercase() == self.key
    }
}

impl PartialEq for DoctorName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DoctorName {}

impl core::hash::Hash for DoctorName {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl core::fmt::Display for DoctorName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.display)
    }
}

impl TryFrom<String> for DoctorName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DoctorName> for String {
    fn from(value: DoctorName) -> Self {
        value.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compare_trimmed_and_case_insensitive() {
        let a = DoctorName::new("  Dr. Kim ").unwrap();
        let b = DoctorName::new("dr. kim").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Dr. Kim");
        assert_eq!(a.key(), "dr. kim");
        assert!(a.matches("DR. KIM  "));
        assert!(!a.matches("Dr. Lee"));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(DoctorName::new("   ").is_err());
    }
}
