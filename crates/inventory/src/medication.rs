use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{require_text, DomainError, DomainResult, Entity, MedicationId};

/// Upper bound for any single stock figure: thresholds, reorder size, or the
/// quantity of one stock movement.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Catalogue entry for a stocked medication, with its replenishment policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    pub sku: String,
    /// Critical floor. Stock at or below this is flagged.
    pub minimum_stock: i64,
    /// Stock strictly below this triggers a replenishment order.
    pub reorder_point: i64,
    /// Units requested each time the reorder point is crossed. Zero disables
    /// automatic reordering.
    pub reorder_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Medication {
    type Id = MedicationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Registration form for a medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub sku: String,
    pub minimum_stock: i64,
    pub reorder_point: i64,
    pub reorder_quantity: i64,
}

impl NewMedication {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("sku", &self.sku)?;
        validate_policy(self.minimum_stock, self.reorder_point, self.reorder_quantity)
    }

    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            sku: self.sku.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Replacement values for an existing medication. `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub minimum_stock: Option<i64>,
    pub reorder_point: Option<i64>,
    pub reorder_quantity: Option<i64>,
}

impl MedicationUpdate {
    /// Apply onto `medication`; the result must still be a valid policy.
    /// On error the medication is left as it was.
    pub fn apply_to(&self, medication: &mut Medication, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = medication.clone();
        if let Some(name) = &self.name {
            require_text("name", name)?;
            next.name = name.trim().to_string();
        }
        if let Some(sku) = &self.sku {
            require_text("sku", sku)?;
            next.sku = sku.trim().to_string();
        }
        if let Some(v) = self.minimum_stock {
            next.minimum_stock = v;
        }
        if let Some(v) = self.reorder_point {
            next.reorder_point = v;
        }
        if let Some(v) = self.reorder_quantity {
            next.reorder_quantity = v;
        }
        validate_policy(next.minimum_stock, next.reorder_point, next.reorder_quantity)?;

        next.updated_at = now;
        *medication = next;
        Ok(())
    }
}

fn validate_policy(minimum_stock: i64, reorder_point: i64, reorder_quantity: i64) -> DomainResult<()> {
    if minimum_stock < 0 || reorder_point < 0 || reorder_quantity < 0 {
        return Err(DomainError::validation("stock thresholds cannot be negative"));
    }
    if minimum_stock > MAX_QUANTITY || reorder_point > MAX_QUANTITY || reorder_quantity > MAX_QUANTITY {
        return Err(DomainError::validation(format!(
            "stock thresholds cannot exceed {MAX_QUANTITY}"
        )));
    }
    if minimum_stock > reorder_point {
        return Err(DomainError::validation(
            "minimum stock cannot exceed the reorder point",
        ));
    }
    Ok(())
}
