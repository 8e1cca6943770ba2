//! Concrete reorder notifiers.

use std::sync::Arc;
use std::time::Duration;

use clinic_events::EventBus;
use clinic_inventory::{NotifyError, ReorderNotice, ReorderNotifier};

/// Writes each notice as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ReorderNotifier for TracingNotifier {
    fn notify(&self, notice: &ReorderNotice) -> Result<(), NotifyError> {
        tracing::info!(
            purchase_order_id = %notice.purchase_order_id,
            medication_id = %notice.medication_id,
            medication = %notice.medication_name,
            sku = %notice.sku,
            after_stock = notice.after_stock,
            reorder_quantity = notice.reorder_quantity,
            reorder_point = notice.reorder_point,
            minimum_stock = notice.minimum_stock,
            "{}",
            notice.subject()
        );
        Ok(())
    }
}

/// Publishes notices on an event bus for in-process subscribers.
#[derive(Debug, Clone)]
pub struct BusNotifier<B> {
    bus: B,
}

impl<B> BusNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B> ReorderNotifier for BusNotifier<B>
where
    B: EventBus<ReorderNotice>,
{
    fn notify(&self, notice: &ReorderNotice) -> Result<(), NotifyError> {
        self.bus
            .publish(notice.clone())
            .map_err(|e| NotifyError::Delivery(format!("event bus: {e:?}")))
    }
}

/// POSTs each notice as JSON to a configured endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::blocking::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(NotifyError::NotConfigured("webhook url is empty".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::NotConfigured(e.to_string()))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReorderNotifier for WebhookNotifier {
    fn notify(&self, notice: &ReorderNotice) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notice)
            .send()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Delivers to every inner notifier, even after one fails, and reports the
/// first failure.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn ReorderNotifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Arc<dyn ReorderNotifier>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl core::fmt::Debug for FanoutNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FanoutNotifier")
            .field("targets", &self.targets.len())
            .finish()
    }
}

impl ReorderNotifier for FanoutNotifier {
    fn notify(&self, notice: &ReorderNotice) -> Result<(), NotifyError> {
        let mut first_error = None;
        for target in &self.targets {
            if let Err(err) = target.notify(notice) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clinic_core::{MedicationId, PurchaseOrderId};
    use clinic_events::InMemoryEventBus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn notice() -> ReorderNotice {
        ReorderNotice {
            purchase_order_id: PurchaseOrderId::new(),
            medication_id: MedicationId::new(),
            medication_name: "Amoxicillin 250mg".to_string(),
            sku: "AMOXI-250".to_string(),
            after_stock: 15,
            reorder_quantity: 100,
            reorder_point: 30,
            minimum_stock: 10,
            raised_at: Utc::now(),
        }
    }

    struct Counting(AtomicUsize);

    impl ReorderNotifier for Counting {
        fn notify(&self, _notice: &ReorderNotice) -> Result<(), NotifyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl ReorderNotifier for Failing {
        fn notify(&self, _notice: &ReorderNotice) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    #[test]
    fn bus_notifier_publishes_to_subscribers() {
        let bus = Arc::new(InMemoryEventBus::<ReorderNotice>::new());
        let sub = bus.subscribe();
        let notifier = BusNotifier::new(bus.clone());
        let n = notice();

        notifier.notify(&n).unwrap();

        assert_eq!(sub.try_recv().unwrap(), n);
        assert_eq!(bus.published(), 1);
    }

    #[test]
    fn fanout_reaches_everyone_and_reports_failure() {
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let fanout = FanoutNotifier::new()
            .with(Arc::new(Failing))
            .with(counter.clone());

        let result = fanout.notify(&notice());

        assert_eq!(result, Err(NotifyError::Delivery("smtp down".to_string())));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(fanout.len(), 2);
    }

    #[test]
    fn webhook_requires_a_url() {
        assert!(matches!(
            WebhookNotifier::new("  "),
            Err(NotifyError::NotConfigured(_))
        ));
    }
}
