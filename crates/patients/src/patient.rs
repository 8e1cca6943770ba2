use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{require_text, DomainResult, Entity, PatientId, StoreResult};

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    /// National resident registration number (`YYMMDD-NNNNNNN`).
    pub resident_registration_number: String,
    pub address: String,
    pub contact: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Registration number with everything after the birth-date part hidden.
    pub fn masked_registration_number(&self) -> String {
        mask_registration_number(&self.resident_registration_number)
    }
}

impl Entity for Patient {
    type Id = PatientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn mask_registration_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 6 {
        return "*".repeat(raw.chars().count());
    }
    format!("{}-*******", &digits[..6])
}

/// Registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub resident_registration_number: String,
    pub address: String,
    pub contact: String,
}

impl NewPatient {
    /// All four fields are required.
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("resident_registration_number", &self.resident_registration_number)?;
        require_text("address", &self.address)?;
        require_text("contact", &self.contact)?;
        Ok(())
    }

    /// Copy with every field trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            resident_registration_number: self.resident_registration_number.trim().to_string(),
            address: self.address.trim().to_string(),
            contact: self.contact.trim().to_string(),
        }
    }
}

/// Partial update: `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
}

impl PatientUpdate {
    /// Apply onto `patient`, rejecting blank replacements.
    pub fn apply_to(&self, patient: &mut Patient) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(address) = &self.address {
            require_text("address", address)?;
        }
        if let Some(contact) = &self.contact {
            require_text("contact", contact)?;
        }

        if let Some(name) = &self.name {
            patient.name = name.trim().to_string();
        }
        if let Some(address) = &self.address {
            patient.address = address.trim().to_string();
        }
        if let Some(contact) = &self.contact {
            patient.contact = contact.trim().to_string();
        }
        Ok(())
    }
}

/// Patient persistence seam.
pub trait PatientStore: Send + Sync {
    /// Persist a validated registration and return it with its assigned id.
    fn insert(&self, patient: NewPatient) -> StoreResult<Patient>;
    fn get(&self, id: PatientId) -> StoreResult<Option<Patient>>;
    /// All patients, oldest registration first.
    fn list(&self) -> StoreResult<Vec<Patient>>;
    /// Overwrite an existing record. Returns `false` when the id is unknown.
    fn update(&self, patient: &Patient) -> StoreResult<bool>;
}

impl<S> PatientStore for Arc<S>
where
    S: PatientStore + ?Sized,
{
    fn insert(&self, patient: NewPatient) -> StoreResult<Patient> {
        (**self).insert(patient)
    }

    fn get(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        (**self).get(id)
    }

    fn list(&self) -> StoreResult<Vec<Patient>> {
        (**self).list()
    }

    fn update(&self, patient: &Patient) -> StoreResult<bool> {
        (**self).update(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::DomainError;

    fn form() -> NewPatient {
        NewPatient {
            name: "  Kim Minji ".to_string(),
            resident_registration_number: "900101-2345678".to_string(),
            address: "Seoul".to_string(),
            contact: "010-1234-5678".to_string(),
        }
    }

    fn patient() -> Patient {
        let now = Utc::now();
        let f = form().normalized();
        Patient {
            id: PatientId::new(),
            name: f.name,
            resident_registration_number: f.resident_registration_number,
            address: f.address,
            contact: f.contact,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn registration_requires_every_field() {
        assert!(form().validate().is_ok());

        let mut missing = form();
        missing.contact = " ".to_string();
        match missing.validate().unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("contact")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn normalized_trims_fields() {
        assert_eq!(form().normalized().name, "Kim Minji");
    }

    #[test]
    fn registration_number_is_masked_after_birth_date() {
        assert_eq!(patient().masked_registration_number(), "900101-*******");

        let mut short = patient();
        short.resident_registration_number = "1234".to_string();
        assert_eq!(short.masked_registration_number(), "****");
    }

    #[test]
    fn update_rejects_blank_and_leaves_record_untouched() {
        let mut p = patient();
        let before = p.clone();
        let update = PatientUpdate {
            name: Some("New Name".to_string()),
            address: Some("".to_string()),
            contact: None,
        };
        assert!(update.apply_to(&mut p).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn update_applies_trimmed_values() {
        let mut p = patient();
        let update = PatientUpdate {
            contact: Some(" 02-555-0100 ".to_string()),
            ..PatientUpdate::default()
        };
        update.apply_to(&mut p).unwrap();
        assert_eq!(p.contact, "02-555-0100");
        assert_eq!(p.name, "Kim Minji");
    }
}
