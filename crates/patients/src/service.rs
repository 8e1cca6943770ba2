use thiserror::Error;

use clinic_core::{DomainError, PatientId, StoreError};

use crate::patient::{NewPatient, Patient, PatientStore, PatientUpdate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatientError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registration and lookup of patients.
#[derive(Debug, Clone)]
pub struct PatientService<S> {
    store: S,
}

impl<S> PatientService<S>
where
    S: PatientStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn register(&self, form: NewPatient) -> Result<Patient, PatientError> {
        form.validate()?;
        let patient = self.store.insert(form.normalized())?;
        tracing::info!(patient_id = %patient.id, "patient registered");
        Ok(patient)
    }

    pub fn update(&self, id: PatientId, update: PatientUpdate) -> Result<Patient, PatientError> {
        let mut patient = self.store.get(id)?.ok_or(DomainError::NotFound)?;
        update.apply_to(&mut patient)?;
        patient.updated_at = chrono::Utc::now();
        if !self.store.update(&patient)? {
            return Err(DomainError::NotFound.into());
        }
        tracing::info!(patient_id = %id, "patient updated");
        Ok(patient)
    }

    pub fn patient(&self, id: PatientId) -> Result<Option<Patient>, PatientError> {
        Ok(self.store.get(id)?)
    }

    pub fn patients(&self) -> Result<Vec<Patient>, PatientError> {
        Ok(self.store.list()?)
    }
}
