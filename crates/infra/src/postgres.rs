//! Postgres-backed clinic store.
//!
//! The store traits are synchronous, so every method drives its query with
//! `Handle::block_on`. Call it from a blocking thread (`spawn_blocking`),
//! never from inside an async task.
//!
//! ## Conditional writes
//!
//! | operation | mechanism |
//! |---|---|
//! | `decrease_if_available` | `UPDATE ... WHERE quantity >= $n` |
//! | `insert_or_increase_pending` | `INSERT ... ON CONFLICT` on the one-pending-order partial index |
//! | `update_status` | `UPDATE ... WHERE status = $from` |
//! | appointment `insert` / `update` | partial unique index on `(doctor_key, scheduled_at)` for active rows |
//!
//! ## Error mapping
//!
//! Unique violations (`23505`) that are not folded into a domain outcome, and
//! `bigint` overflow (`22003`), become `StoreError::Conflict`; everything else
//! is `StoreError::Unavailable`.

use std::future::Future;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tokio::runtime::Handle;
use uuid::Uuid;

use clinic_core::{AppointmentId, MedicationId, PatientId, PurchaseOrderId, StoreError, StoreResult};
use clinic_inventory::{Decrease, InventoryStore, Medication, MedicationStore, NewMedication};
use clinic_patients::{NewPatient, Patient, PatientStore};
use clinic_purchasing::{PurchaseOrder, PurchaseOrderStatus, PurchaseOrderStore};
use clinic_scheduling::{Appointment, AppointmentStatus, AppointmentStore, DoctorName, NewAppointment, SlotWrite};

const SCHEMA: &str = include_str!("../migrations/0001_clinic.sql");

const UNIQUE_VIOLATION: &str = "23505";
const NUMERIC_OUT_OF_RANGE: &str = "22003";

#[derive(Debug, Clone)]
pub struct PgClinicStore {
    pool: PgPool,
    handle: Handle,
}

impl PgClinicStore {
    /// Connect, then apply the schema.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool, Handle::current());
        store.migrate().await?;
        Ok(store)
    }

    pub fn new(pool: PgPool, handle: Handle) -> Self {
        Self { pool, handle }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("clinic schema applied");
        Ok(())
    }

    fn run<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        self.handle.block_on(fut).map_err(|e| map_sqlx_error(operation, e))
    }

    fn slot_holder(&self, doctor_key: &str, at: chrono::NaiveDateTime) -> StoreResult<Option<AppointmentId>> {
        let row = self.run(
            "slot_holder",
            sqlx::query(
                "SELECT id FROM appointments \
                 WHERE doctor_key = $1 AND scheduled_at = $2 AND status <> 'Cancelled'",
            )
            .bind(doctor_key)
            .bind(at)
            .fetch_optional(&self.pool),
        )?;
        row.map(|r| r.try_get::<Uuid, _>("id").map(AppointmentId::from))
            .transpose()
            .map_err(|e| map_sqlx_error("slot_holder", e))
    }

    fn conflict_with_holder(&self, doctor: &DoctorName, at: chrono::NaiveDateTime) -> StoreResult<SlotWrite> {
        match self.slot_holder(doctor.key(), at)? {
            Some(existing) => Ok(SlotWrite::Conflict { existing }),
            None => Err(StoreError::Conflict(format!(
                "slot {at} for {doctor} changed during write"
            ))),
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(format!("{operation}: {}", db_err.message()))
        }
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
            StoreError::Conflict(format!("{operation}: {}", db_err.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::corrupt(format!("{operation}: {err}"))
        }
        _ => StoreError::unavailable(format!("{operation}: {err}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

fn patient_from_row(row: &PgRow) -> Result<Patient, sqlx::Error> {
    Ok(Patient {
        id: PatientId::from(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        resident_registration_number: row.try_get("resident_registration_number")?,
        address: row.try_get("address")?,
        contact: row.try_get("contact")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn medication_from_row(row: &PgRow) -> Result<Medication, sqlx::Error> {
    Ok(Medication {
        id: MedicationId::from(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        minimum_stock: row.try_get("minimum_stock")?,
        reorder_point: row.try_get("reorder_point")?,
        reorder_quantity: row.try_get("reorder_quantity")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> StoreResult<PurchaseOrder> {
    let decode = |e| map_sqlx_error("purchase_order_row", e);
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(PurchaseOrder {
        id: PurchaseOrderId::from(row.try_get::<Uuid, _>("id").map_err(decode)?),
        medication_id: MedicationId::from(row.try_get::<Uuid, _>("medication_id").map_err(decode)?),
        quantity: row.try_get("quantity").map_err(decode)?,
        status: status
            .parse::<PurchaseOrderStatus>()
            .map_err(|e| StoreError::corrupt(e.to_string()))?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

fn appointment_from_row(row: &PgRow) -> StoreResult<Appointment> {
    let decode = |e| map_sqlx_error("appointment_row", e);
    let doctor: String = row.try_get("doctor_name").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(Appointment {
        id: AppointmentId::from(row.try_get::<Uuid, _>("id").map_err(decode)?),
        patient_id: PatientId::from(row.try_get::<Uuid, _>("patient_id").map_err(decode)?),
        doctor_name: DoctorName::new(&doctor).map_err(|e| StoreError::corrupt(e.to_string()))?,
        scheduled_at: row.try_get("scheduled_at").map_err(decode)?,
        reason: row.try_get("reason").map_err(decode)?,
        status: status
            .parse::<AppointmentStatus>()
            .map_err(|e| StoreError::corrupt(e.to_string()))?,
        notes: row.try_get("notes").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

fn map_rows<T>(rows: Vec<PgRow>, f: impl Fn(&PgRow) -> StoreResult<T>) -> StoreResult<Vec<T>> {
    rows.iter().map(f).collect()
}

impl PatientStore for PgClinicStore {
    fn insert(&self, patient: NewPatient) -> StoreResult<Patient> {
        let now = Utc::now();
        let record = Patient {
            id: PatientId::new(),
            name: patient.name,
            resident_registration_number: patient.resident_registration_number,
            address: patient.address,
            contact: patient.contact,
            created_at: now,
            updated_at: now,
        };
        self.run(
            "insert_patient",
            sqlx::query(
                "INSERT INTO patients \
                 (id, name, resident_registration_number, address, contact, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(&record.resident_registration_number)
            .bind(&record.address)
            .bind(&record.contact)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool),
        )?;
        Ok(record)
    }

    fn get(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        let row = self.run(
            "get_patient",
            sqlx::query("SELECT * FROM patients WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool),
        )?;
        row.as_ref()
            .map(patient_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_patient", e))
    }

    fn list(&self) -> StoreResult<Vec<Patient>> {
        let rows = self.run(
            "list_patients",
            sqlx::query("SELECT * FROM patients ORDER BY created_at, id").fetch_all(&self.pool),
        )?;
        map_rows(rows, |r| patient_from_row(r).map_err(|e| map_sqlx_error("list_patients", e)))
    }

    fn update(&self, patient: &Patient) -> StoreResult<bool> {
        let result = self.run(
            "update_patient",
            sqlx::query(
                "UPDATE patients SET name = $2, address = $3, contact = $4, updated_at = $5 \
                 WHERE id = $1",
            )
            .bind(patient.id.as_uuid())
            .bind(&patient.name)
            .bind(&patient.address)
            .bind(&patient.contact)
            .bind(patient.updated_at)
            .execute(&self.pool),
        )?;
        Ok(result.rows_affected() > 0)
    }
}

impl MedicationStore for PgClinicStore {
    fn insert(&self, medication: NewMedication) -> StoreResult<Medication> {
        let now = Utc::now();
        let record = Medication {
            id: MedicationId::new(),
            name: medication.name,
            sku: medication.sku,
            minimum_stock: medication.minimum_stock,
            reorder_point: medication.reorder_point,
            reorder_quantity: medication.reorder_quantity,
            created_at: now,
            updated_at: now,
        };
        self.run(
            "insert_medication",
            sqlx::query(
                "INSERT INTO medications \
                 (id, name, sku, minimum_stock, reorder_point, reorder_quantity, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(&record.sku)
            .bind(record.minimum_stock)
            .bind(record.reorder_point)
            .bind(record.reorder_quantity)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool),
        )?;
        Ok(record)
    }

    fn get(&self, id: MedicationId) -> StoreResult<Option<Medication>> {
        let row = self.run(
            "get_medication",
            sqlx::query("SELECT * FROM medications WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool),
        )?;
        row.as_ref()
            .map(medication_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_medication", e))
    }

    fn list(&self) -> StoreResult<Vec<Medication>> {
        let rows = self.run(
            "list_medications",
            sqlx::query("SELECT * FROM medications ORDER BY name, id").fetch_all(&self.pool),
        )?;
        map_rows(rows, |r| {
            medication_from_row(r).map_err(|e| map_sqlx_error("list_medications", e))
        })
    }

    fn update(&self, medication: &Medication) -> StoreResult<bool> {
        let result = self.run(
            "update_medication",
            sqlx::query(
                "UPDATE medications SET name = $2, sku = $3, minimum_stock = $4, \
                 reorder_point = $5, reorder_quantity = $6, updated_at = $7 WHERE id = $1",
            )
            .bind(medication.id.as_uuid())
            .bind(&medication.name)
            .bind(&medication.sku)
            .bind(medication.minimum_stock)
            .bind(medication.reorder_point)
            .bind(medication.reorder_quantity)
            .bind(medication.updated_at)
            .execute(&self.pool),
        )?;
        Ok(result.rows_affected() > 0)
    }
}

impl InventoryStore for PgClinicStore {
    fn quantity(&self, medication_id: MedicationId) -> StoreResult<i64> {
        let level = self.run(
            "quantity",
            sqlx::query_scalar::<_, i64>("SELECT quantity FROM inventory_levels WHERE medication_id = $1")
                .bind(medication_id.as_uuid())
                .fetch_optional(&self.pool),
        )?;
        Ok(level.unwrap_or(0))
    }

    fn upsert_quantity(&self, medication_id: MedicationId, quantity: i64) -> StoreResult<()> {
        self.run(
            "upsert_quantity",
            sqlx::query(
                "INSERT INTO inventory_levels (medication_id, quantity) VALUES ($1, $2) \
                 ON CONFLICT (medication_id) DO UPDATE SET quantity = EXCLUDED.quantity",
            )
            .bind(medication_id.as_uuid())
            .bind(quantity)
            .execute(&self.pool),
        )?;
        Ok(())
    }

    fn increase(&self, medication_id: MedicationId, delta: i64) -> StoreResult<i64> {
        self.run(
            "increase",
            sqlx::query_scalar::<_, i64>(
                "INSERT INTO inventory_levels (medication_id, quantity) VALUES ($1, $2) \
                 ON CONFLICT (medication_id) \
                 DO UPDATE SET quantity = inventory_levels.quantity + EXCLUDED.quantity \
                 RETURNING quantity",
            )
            .bind(medication_id.as_uuid())
            .bind(delta)
            .fetch_one(&self.pool),
        )
    }

    fn decrease_if_available(&self, medication_id: MedicationId, delta: i64) -> StoreResult<Decrease> {
        let after = self.run(
            "decrease_if_available",
            sqlx::query_scalar::<_, i64>(
                "UPDATE inventory_levels SET quantity = quantity - $2 \
                 WHERE medication_id = $1 AND quantity >= $2 RETURNING quantity",
            )
            .bind(medication_id.as_uuid())
            .bind(delta)
            .fetch_optional(&self.pool),
        )?;
        match after {
            Some(after) => Ok(Decrease::Applied { after }),
            None => Ok(Decrease::Insufficient {
                available: self.quantity(medication_id)?,
            }),
        }
    }
}

impl PurchaseOrderStore for PgClinicStore {
    fn insert_or_increase_pending(
        &self,
        medication_id: MedicationId,
        quantity: i64,
    ) -> StoreResult<PurchaseOrderId> {
        let id = self.run(
            "insert_or_increase_pending",
            sqlx::query_scalar::<_, Uuid>(
                "INSERT INTO purchase_orders (id, medication_id, quantity, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, 'Pending', $4, $4) \
                 ON CONFLICT (medication_id) WHERE status = 'Pending' \
                 DO UPDATE SET quantity = purchase_orders.quantity + EXCLUDED.quantity, \
                               updated_at = EXCLUDED.updated_at \
                 RETURNING id",
            )
            .bind(PurchaseOrderId::new().as_uuid())
            .bind(medication_id.as_uuid())
            .bind(quantity)
            .bind(Utc::now())
            .fetch_one(&self.pool),
        )?;
        Ok(PurchaseOrderId::from(id))
    }

    fn get(&self, id: PurchaseOrderId) -> StoreResult<Option<PurchaseOrder>> {
        let row = self.run(
            "get_purchase_order",
            sqlx::query("SELECT * FROM purchase_orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool),
        )?;
        row.as_ref().map(order_from_row).transpose()
    }

    fn list(&self) -> StoreResult<Vec<PurchaseOrder>> {
        let rows = self.run(
            "list_purchase_orders",
            sqlx::query("SELECT * FROM purchase_orders ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool),
        )?;
        map_rows(rows, order_from_row)
    }

    fn list_for_medication(&self, medication_id: MedicationId) -> StoreResult<Vec<PurchaseOrder>> {
        let rows = self.run(
            "list_purchase_orders_for_medication",
            sqlx::query(
                "SELECT * FROM purchase_orders WHERE medication_id = $1 \
                 ORDER BY created_at DESC, id DESC",
            )
            .bind(medication_id.as_uuid())
            .fetch_all(&self.pool),
        )?;
        map_rows(rows, order_from_row)
    }

    fn update_status(
        &self,
        id: PurchaseOrderId,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> StoreResult<Option<PurchaseOrder>> {
        let row = self.run(
            "update_purchase_order_status",
            sqlx::query(
                "UPDATE purchase_orders SET status = $3, updated_at = $4 \
                 WHERE id = $1 AND status = $2 RETURNING *",
            )
            .bind(id.as_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(Utc::now())
            .fetch_optional(&self.pool),
        )?;
        row.as_ref().map(order_from_row).transpose()
    }
}

impl AppointmentStore for PgClinicStore {
    fn get(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        let row = self.run(
            "get_appointment",
            sqlx::query("SELECT * FROM appointments WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool),
        )?;
        row.as_ref().map(appointment_from_row).transpose()
    }

    fn list_by_patient(&self, patient_id: PatientId) -> StoreResult<Vec<Appointment>> {
        let rows = self.run(
            "list_appointments_by_patient",
            sqlx::query("SELECT * FROM appointments WHERE patient_id = $1 ORDER BY scheduled_at DESC")
                .bind(patient_id.as_uuid())
                .fetch_all(&self.pool),
        )?;
        map_rows(rows, appointment_from_row)
    }

    fn list_by_doctor_and_date(&self, doctor: &DoctorName, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let day_start = date.and_time(NaiveTime::MIN);
        let rows = self.run(
            "list_appointments_by_doctor_and_date",
            sqlx::query(
                "SELECT * FROM appointments \
                 WHERE doctor_key = $1 AND scheduled_at >= $2 AND scheduled_at < $3 \
                 ORDER BY scheduled_at, id",
            )
            .bind(doctor.key())
            .bind(day_start)
            .bind(day_start + Duration::days(1))
            .fetch_all(&self.pool),
        )?;
        map_rows(rows, appointment_from_row)
    }

    fn distinct_doctor_names(&self) -> StoreResult<Vec<String>> {
        self.run(
            "distinct_doctor_names",
            sqlx::query_scalar::<_, String>(
                "SELECT DISTINCT ON (doctor_key) doctor_name FROM appointments \
                 ORDER BY doctor_key, created_at",
            )
            .fetch_all(&self.pool),
        )
    }

    fn insert(&self, appointment: NewAppointment) -> StoreResult<SlotWrite> {
        let record = appointment.into_appointment(AppointmentId::new(), Utc::now());
        let inserted = self.run(
            "insert_appointment",
            sqlx::query_scalar::<_, Uuid>(
                "INSERT INTO appointments \
                 (id, patient_id, doctor_name, doctor_key, scheduled_at, reason, status, notes, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (doctor_key, scheduled_at) WHERE status <> 'Cancelled' DO NOTHING \
                 RETURNING id",
            )
            .bind(record.id.as_uuid())
            .bind(record.patient_id.as_uuid())
            .bind(record.doctor_name.as_str())
            .bind(record.doctor_name.key())
            .bind(record.scheduled_at)
            .bind(&record.reason)
            .bind(record.status.as_str())
            .bind(&record.notes)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_optional(&self.pool),
        )?;
        match inserted {
            Some(_) => Ok(SlotWrite::Written(record)),
            None => self.conflict_with_holder(&record.doctor_name, record.scheduled_at),
        }
    }

    fn update(&self, appointment: &Appointment) -> StoreResult<SlotWrite> {
        let result = self.handle.block_on(
            sqlx::query(
                "UPDATE appointments SET patient_id = $2, doctor_name = $3, doctor_key = $4, \
                 scheduled_at = $5, reason = $6, status = $7, notes = $8, updated_at = $9 \
                 WHERE id = $1",
            )
            .bind(appointment.id.as_uuid())
            .bind(appointment.patient_id.as_uuid())
            .bind(appointment.doctor_name.as_str())
            .bind(appointment.doctor_name.key())
            .bind(appointment.scheduled_at)
            .bind(&appointment.reason)
            .bind(appointment.status.as_str())
            .bind(&appointment.notes)
            .bind(appointment.updated_at)
            .execute(&self.pool),
        );
        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(SlotWrite::Missing),
            Ok(_) => Ok(SlotWrite::Written(appointment.clone())),
            Err(e) if is_unique_violation(&e) => {
                self.conflict_with_holder(&appointment.doctor_name, appointment.scheduled_at)
            }
            Err(e) => Err(map_sqlx_error("update_appointment", e)),
        }
    }

    fn cancel(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        let row = self.run(
            "cancel_appointment",
            sqlx::query(
                "UPDATE appointments SET status = 'Cancelled', updated_at = $2 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(id.as_uuid())
            .bind(Utc::now())
            .fetch_optional(&self.pool),
        )?;
        row.as_ref().map(appointment_from_row).transpose()
    }
}
