//! Pure threshold evaluation.

use serde::{Deserialize, Serialize};

use clinic_core::ValueObject;

use crate::medication::Medication;

/// Snapshot of where a medication's stock sits relative to its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    /// `current_stock <= minimum_stock`
    pub at_or_below_minimum: bool,
    /// `current_stock < reorder_point`
    pub below_reorder_point: bool,
    pub current_stock: i64,
    pub reorder_point: i64,
    pub minimum_stock: i64,
}

impl ValueObject for ThresholdCheck {}

impl ThresholdCheck {
    pub fn evaluate(medication: &Medication, current_stock: i64) -> Self {
        Self {
            at_or_below_minimum: current_stock <= medication.minimum_stock,
            below_reorder_point: current_stock < medication.reorder_point,
            current_stock,
            reorder_point: medication.reorder_point,
            minimum_stock: medication.minimum_stock,
        }
    }

    /// Result for an unknown medication: everything false/zero.
    pub fn unknown() -> Self {
        Self {
            at_or_below_minimum: false,
            below_reorder_point: false,
            current_stock: 0,
            reorder_point: 0,
            minimum_stock: 0,
        }
    }
}

/// Warning shown before a prescription is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAlert {
    /// Projected stock is at or below the minimum: reordering is urgent.
    AtOrBelowMinimum,
    /// Projected stock is below the reorder point: an order will be raised.
    BelowReorderPoint,
}

/// What a prescription of a given size would do to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionPreview {
    pub current_stock: i64,
    pub projected_stock: i64,
    pub alert: Option<StockAlert>,
}

impl ValueObject for PrescriptionPreview {}

impl PrescriptionPreview {
    /// Negative quantities count as zero and the projection never drops
    /// below zero; the minimum check takes precedence over the reorder check.
    pub fn project(medication: &Medication, current_stock: i64, quantity: i64) -> Self {
        let projected_stock = (current_stock - quantity.max(0)).max(0);
        let alert = if projected_stock <= medication.minimum_stock {
            Some(StockAlert::AtOrBelowMinimum)
        } else if projected_stock < medication.reorder_point {
            Some(StockAlert::BelowReorderPoint)
        } else {
            None
        };
        Self {
            current_stock,
            projected_stock,
            alert,
        }
    }
}
