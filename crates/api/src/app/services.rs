//! Service wiring: store backend, notifiers, and the recent-notice feed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use clinic_events::{EventBus, InMemoryEventBus};
use clinic_infra::{
    BusNotifier, ClinicConfig, FanoutNotifier, InMemoryClinicStore, PgClinicStore, SharedStore,
    TracingNotifier, WebhookNotifier,
};
use clinic_inventory::{InventoryService, ReorderNotice, ReorderNotifier};
use clinic_patients::PatientService;
use clinic_purchasing::PurchasingService;
use clinic_scheduling::{SchedulingService, WorkingHours};

use crate::app::errors::{self, ErrorResponse};

pub type Inventory = InventoryService<SharedStore, SharedStore, SharedStore, Arc<dyn ReorderNotifier>>;
pub type Scheduling = SchedulingService<SharedStore, SharedStore>;
pub type Purchasing = PurchasingService<SharedStore>;
pub type Patients = PatientService<SharedStore>;

const NOTICE_FEED_CAPACITY: usize = 100;

/// Most recent reorder notices, newest first, bounded.
#[derive(Debug, Default)]
pub struct NoticeFeed {
    notices: Mutex<VecDeque<ReorderNotice>>,
}

impl NoticeFeed {
    fn push(&self, notice: ReorderNotice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push_front(notice);
            notices.truncate(NOTICE_FEED_CAPACITY);
        }
    }

    pub fn recent(&self) -> Vec<ReorderNotice> {
        self.notices
            .lock()
            .map(|n| n.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Every service the HTTP layer calls, built once at startup.
pub struct AppServices {
    pub inventory: Inventory,
    pub scheduling: Scheduling,
    pub purchasing: Purchasing,
    pub patients: Patients,
    pub notices: Arc<NoticeFeed>,
    backend: &'static str,
}

impl AppServices {
    /// Wire all services around one store. Reorder notices go to the log,
    /// to the in-process feed and, when given, to a webhook.
    pub fn new(store: SharedStore, hours: WorkingHours, webhook: Option<WebhookNotifier>) -> Self {
        let bus = Arc::new(InMemoryEventBus::<ReorderNotice>::new());
        let notices = Arc::new(NoticeFeed::default());

        // Subscribe before anything can publish.
        {
            let sub = bus.subscribe();
            let notices = notices.clone();
            let spawned = std::thread::Builder::new()
                .name("reorder-notice-feed".to_string())
                .spawn(move || {
                    while let Ok(notice) = sub.recv() {
                        notices.push(notice);
                    }
                });
            if let Err(e) = spawned {
                tracing::warn!(error = %e, "notice feed listener not started");
            }
        }

        let mut fanout = FanoutNotifier::new()
            .with(Arc::new(TracingNotifier))
            .with(Arc::new(BusNotifier::new(bus)));
        if let Some(webhook) = webhook {
            tracing::info!(url = %webhook.url(), "reorder webhook enabled");
            fanout = fanout.with(Arc::new(webhook));
        }
        let notifier: Arc<dyn ReorderNotifier> = Arc::new(fanout);

        Self {
            inventory: InventoryService::new(store.clone(), store.clone(), store.clone(), notifier),
            scheduling: SchedulingService::new(store.clone(), store.clone(), hours),
            purchasing: PurchasingService::new(store.clone()),
            patients: PatientService::new(store.clone()),
            notices,
            backend: store.backend(),
        }
    }

    /// In-memory backend with default working hours; used by tests and dev runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryClinicStore::new()), WorkingHours::default(), None)
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &ClinicConfig) -> anyhow::Result<AppServices> {
    let store: SharedStore = match &config.database_url {
        Some(url) => Arc::new(
            PgClinicStore::connect(url)
                .await
                .context("failed to open Postgres store")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryClinicStore::new())
        }
    };

    // The blocking HTTP client must be built off the async runtime.
    let webhook = match config.notify_webhook_url.clone() {
        Some(url) => Some(
            tokio::task::spawn_blocking(move || WebhookNotifier::new(url))
                .await
                .context("webhook setup task failed")?
                .context("invalid reorder webhook")?,
        ),
        None => None,
    };

    let services = AppServices::new(store, config.working_hours, webhook);
    tracing::info!(backend = services.backend(), "services ready");
    Ok(services)
}

/// Run a blocking service call off the async runtime and turn its outcome
/// into a JSON response with `status` on success.
pub async fn respond<T, E, F>(services: &Arc<AppServices>, status: StatusCode, call: F) -> Response
where
    F: FnOnce(&AppServices) -> Result<T, E> + Send + 'static,
    T: Serialize + Send + 'static,
    E: ErrorResponse + Send + 'static,
{
    let services = services.clone();
    match tokio::task::spawn_blocking(move || call(&services)).await {
        Ok(Ok(value)) => (status, Json(value)).into_response(),
        Ok(Err(err)) => err.into_error_response(),
        Err(join) => {
            tracing::warn!(error = %join, "service task failed");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "service task failed")
        }
    }
}
