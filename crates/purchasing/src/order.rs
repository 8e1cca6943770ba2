use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{DomainError, Entity, MedicationId, PurchaseOrderId, StoreResult};

/// Purchase order status lifecycle.
///
/// ```text
/// Pending ──► Ordered ──► Received
///    │           │
///    └───────────┴──► Cancelled
/// ```
///
/// `Pending -> Received` is also allowed: stock sometimes arrives before the
/// order was formally placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseOrderStatus {
    Pending,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Ordered => "Ordered",
            Self::Received => "Received",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Received and Cancelled orders never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Received | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        matches!(
            (self, next),
            (Pending, Ordered)
                | (Pending, Received)
                | (Pending, Cancelled)
                | (Ordered, Received)
                | (Ordered, Cancelled)
        )
    }

    /// Validate `self -> next`.
    pub fn check_transition(&self, next: PurchaseOrderStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "purchase order cannot move from {} to {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

impl core::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "ordered" => Ok(Self::Ordered),
            "received" => Ok(Self::Received),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown purchase order status '{other}'"
            ))),
        }
    }
}

/// A replenishment order for a single medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub medication_id: MedicationId,
    pub quantity: i64,
    pub status: PurchaseOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// A fresh pending order, as stores create it on first demand.
    pub fn pending(medication_id: MedicationId, quantity: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: PurchaseOrderId::new(),
            medication_id,
            quantity,
            status: PurchaseOrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold additional demand into a pending order. On overflow the order
    /// is left untouched.
    pub fn accumulate(&mut self, quantity: i64, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.quantity = self.quantity.checked_add(quantity).ok_or_else(|| {
            DomainError::invariant(format!(
                "purchase order {} quantity {} cannot grow by {quantity}",
                self.id, self.quantity
            ))
        })?;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == PurchaseOrderStatus::Pending
    }
}

impl Entity for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Purchase order persistence seam.
pub trait PurchaseOrderStore: Send + Sync {
    /// Atomically add `quantity` to the medication's pending order, creating
    /// one if none is outstanding. Returns the order id.
    fn insert_or_increase_pending(
        &self,
        medication_id: MedicationId,
        quantity: i64,
    ) -> StoreResult<PurchaseOrderId>;

    fn get(&self, id: PurchaseOrderId) -> StoreResult<Option<PurchaseOrder>>;

    /// All orders, newest first.
    fn list(&self) -> StoreResult<Vec<PurchaseOrder>>;

    /// Orders for one medication, newest first.
    fn list_for_medication(&self, medication_id: MedicationId) -> StoreResult<Vec<PurchaseOrder>>;

    /// Compare-and-set the status: applies `to` only while the order is still
    /// in `from`. Returns the updated order, or `None` when the id is unknown
    /// or the status no longer matches.
    fn update_status(
        &self,
        id: PurchaseOrderId,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> StoreResult<Option<PurchaseOrder>>;
}

impl<S> PurchaseOrderStore for Arc<S>
where
    S: PurchaseOrderStore + ?Sized,
{
    fn insert_or_increase_pending(
        &self,
        medication_id: MedicationId,
        quantity: i64,
    ) -> StoreResult<PurchaseOrderId> {
        (**self).insert_or_increase_pending(medication_id, quantity)
    }

    fn get(&self, id: PurchaseOrderId) -> StoreResult<Option<PurchaseOrder>> {
        (**self).get(id)
    }

    fn list(&self) -> StoreResult<Vec<PurchaseOrder>> {
        (**self).list()
    }

    fn list_for_medication(&self, medication_id: MedicationId) -> StoreResult<Vec<PurchaseOrder>> {
        (**self).list_for_medication(medication_id)
    }

    fn update_status(
        &self,
        id: PurchaseOrderId,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> StoreResult<Option<PurchaseOrder>> {
        (**self).update_status(id, from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PurchaseOrderStatus::*;

    const ALL: [PurchaseOrderStatus; 4] = [Pending, Ordered, Received, Cancelled];

    #[test]
    fn happy_path_transitions_are_allowed() {
        assert!(Pending.can_transition_to(Ordered));
        assert!(Ordered.can_transition_to(Received));
        assert!(Pending.can_transition_to(Received));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Ordered.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_never_move() {
        for from in [Received, Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} should be rejected");
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for s in ALL {
            assert!(s.check_transition(s).is_err());
        }
    }

    #[test]
    fn ordered_cannot_go_back_to_pending() {
        match Ordered.check_transition(Pending).unwrap_err() {
            DomainError::InvariantViolation(msg) => {
                assert_eq!(msg, "purchase order cannot move from Ordered to Pending")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("pending".parse::<PurchaseOrderStatus>().unwrap(), Pending);
        assert_eq!(" ORDERED ".parse::<PurchaseOrderStatus>().unwrap(), Ordered);
        assert_eq!("canceled".parse::<PurchaseOrderStatus>().unwrap(), Cancelled);
        assert!("shipped".parse::<PurchaseOrderStatus>().is_err());
    }

    #[test]
    fn accumulate_adds_quantity_and_touches_timestamp() {
        let created = Utc::now();
        let mut order = PurchaseOrder::pending(MedicationId::new(), 200, created);
        let later = created + chrono::Duration::minutes(5);
        order.accumulate(200, later).unwrap();
        assert_eq!(order.quantity, 400);
        assert_eq!(order.updated_at, later);
        assert_eq!(order.created_at, created);
        assert!(order.is_pending());
    }

    #[test]
    fn accumulate_refuses_to_overflow() {
        let created = Utc::now();
        let mut order = PurchaseOrder::pending(MedicationId::new(), i64::MAX, created);
        let later = created + chrono::Duration::minutes(5);

        assert!(matches!(
            order.accumulate(1, later),
            Err(DomainError::InvariantViolation(_))
        ));
        assert_eq!(order.quantity, i64::MAX);
        assert_eq!(order.updated_at, created);
    }
}
