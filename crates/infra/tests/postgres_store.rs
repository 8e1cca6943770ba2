//! Conditional-write checks against a live Postgres.
//!
//! Ignored by default. Run with
//! `DATABASE_URL=postgres://... cargo test -p clinic-infra -- --ignored`.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::NaiveDate;

use clinic_core::MedicationId;
use clinic_infra::PgClinicStore;
use clinic_inventory::{InventoryService, NewMedication, NoopNotifier};
use clinic_patients::{NewPatient, PatientService};
use clinic_purchasing::PurchasingService;
use clinic_scheduling::{BookingRequest, SchedulingError, SchedulingService, WorkingHours};

/// Connect on a multi-threaded runtime so the store's `block_on` calls have
/// workers driving the IO. `None` when `DATABASE_URL` is unset.
fn connect() -> Option<(tokio::runtime::Runtime, Arc<PgClinicStore>)> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return None;
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let store = runtime.block_on(PgClinicStore::connect(&url)).unwrap();
    Some((runtime, Arc::new(store)))
}

/// Unique per run so repeated runs against one database do not collide.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", MedicationId::new())
}

#[test]
#[ignore = "needs a Postgres reachable through DATABASE_URL"]
fn concurrent_bookings_for_one_slot_admit_exactly_one() {
    let Some((_runtime, store)) = connect() else { return };

    let patient = PatientService::new(store.clone())
        .register(NewPatient {
            name: "Park Jisoo".to_string(),
            resident_registration_number: "900101-1234567".to_string(),
            address: "12 Harbor Road".to_string(),
            contact: "010-1234-5678".to_string(),
        })
        .unwrap()
        .id;
    let svc = Arc::new(SchedulingService::new(store.clone(), store.clone(), WorkingHours::default()));
    let request = BookingRequest {
        patient_id: Some(patient),
        doctor_name: unique("Dr. Kim"),
        date: NaiveDate::from_ymd_opt(2026, 3, 2),
        slot: Some("10:00".to_string()),
        reason: "consultation".to_string(),
        ..BookingRequest::default()
    };

    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let svc = svc.clone();
            let barrier = barrier.clone();
            let request = request.clone();
            thread::spawn(move || {
                barrier.wait();
                svc.book(&request)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, SchedulingError::SlotTaken { .. }), "{err:?}");
    }

    // The slot opens again once the holder cancels.
    let holder = results.into_iter().find_map(Result::ok).unwrap();
    svc.cancel(holder.id).unwrap();
    assert!(svc.book(&request).is_ok());
}

#[test]
#[ignore = "needs a Postgres reachable through DATABASE_URL"]
fn concurrent_reorders_share_one_pending_order() {
    let Some((_runtime, store)) = connect() else { return };

    let svc = Arc::new(InventoryService::new(store.clone(), store.clone(), store.clone(), NoopNotifier));
    let med = svc
        .register_medication(
            NewMedication {
                name: "Acetaminophen 500mg".to_string(),
                sku: unique("ACETA-500"),
                minimum_stock: 20,
                reorder_point: 50,
                reorder_quantity: 200,
            },
            Some(40),
        )
        .unwrap()
        .id;

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let svc = svc.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                svc.consume_on_prescription(med, 1).unwrap()
            })
        })
        .collect();
    let receipts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let pending: Vec<_> = PurchasingService::new(store.clone())
        .orders_for(med)
        .unwrap()
        .into_iter()
        .filter(|o| o.is_pending())
        .collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].quantity, 8 * 200);
    assert!(receipts.iter().all(|r| r.purchase_order_id == Some(pending[0].id)));
    assert_eq!(svc.current_stock(med).unwrap(), 32);
}
