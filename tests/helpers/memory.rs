use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use payrun::core::{AppError, PayoutPeriod, Result};
use payrun::modules::audit::models::{AuditAction, AuditEntry};
use payrun::modules::audit::repositories::AuditRepository;
use payrun::modules::notifications::services::PaymentNotifier;
use payrun::modules::orders::models::{Order, OrderAdjustmentEvent, PaymentStatus};
use payrun::modules::orders::repositories::OrderRepository;
use payrun::modules::organizations::models::Organization;
use payrun::modules::organizations::repositories::OrganizationRepository;
use payrun::modules::payouts::models::{PayoutInvoice, PayoutStatus};
use payrun::modules::payouts::repositories::{
    InsertOutcome, PayoutInvoiceRepository, PayoutListFilter,
};

pub struct InMemoryOrganizationRepository {
    organizations: Mutex<Vec<Organization>>,
}

impl InMemoryOrganizationRepository {
    pub fn new(organizations: Vec<Organization>) -> Self {
        Self {
            organizations: Mutex::new(organizations),
        }
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>> {
        let organizations = self.organizations.lock().unwrap();
        Ok(organizations.iter().find(|org| org.id == id).cloned())
    }
}

pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
    events: Mutex<Vec<OrderAdjustmentEvent>>,
}

impl InMemoryOrderRepository {
    pub fn new(orders: Vec<Order>, events: Vec<OrderAdjustmentEvent>) -> Self {
        Self {
            orders: Mutex::new(orders),
            events: Mutex::new(events),
        }
    }

    pub fn add_order(&self, order: Order) {
        self.orders.lock().unwrap().push(order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_paid_in_window(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<Vec<Order>> {
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .iter()
            .filter(|order| {
                order.organization_id == organization_id
                    && order.payment_status == PaymentStatus::Paid
                    && period.contains(order.order_date)
            })
            .cloned()
            .collect())
    }

    async fn find_adjustments_in_window(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<Vec<OrderAdjustmentEvent>> {
        let orders = self.orders.lock().unwrap();
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|event| {
                orders.iter().any(|order| {
                    order.id == event.order_id
                        && order.organization_id == organization_id
                        && period.contains(order.order_date)
                })
            })
            .cloned()
            .collect())
    }

    async fn organizations_with_paid_orders(&self, period: &PayoutPeriod) -> Result<Vec<String>> {
        let orders = self.orders.lock().unwrap();
        let mut ids: Vec<String> = orders
            .iter()
            .filter(|order| {
                order.payment_status == PaymentStatus::Paid && period.contains(order.order_date)
            })
            .map(|order| order.organization_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

/// Mirrors the MySQL repository's semantics: inserts collide on the
/// (organization, period) key for non-cancelled rows, and transitions are
/// compare-and-swap on the current status.
#[derive(Default)]
pub struct InMemoryPayoutInvoiceRepository {
    invoices: Mutex<Vec<PayoutInvoice>>,
}

impl InMemoryPayoutInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.invoices.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<PayoutInvoice> {
        self.invoices.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayoutInvoiceRepository for InMemoryPayoutInvoiceRepository {
    async fn insert(&self, invoice: &PayoutInvoice) -> Result<InsertOutcome> {
        let mut invoices = self.invoices.lock().unwrap();

        let duplicate = invoices.iter().any(|existing| {
            existing.status != PayoutStatus::Cancelled
                && existing.organization_id == invoice.organization_id
                && existing.period_start == invoice.period_start
                && existing.period_end == invoice.period_end
        });
        if duplicate {
            return Ok(InsertOutcome::DuplicatePeriod);
        }

        if invoices
            .iter()
            .any(|existing| existing.invoice_number == invoice.invoice_number)
        {
            return Ok(InsertOutcome::DuplicatePeriod);
        }

        invoices.push(invoice.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn exists_for_period(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<bool> {
        let invoices = self.invoices.lock().unwrap();
        Ok(invoices.iter().any(|existing| {
            existing.status != PayoutStatus::Cancelled
                && existing.organization_id == organization_id
                && existing.period_start == period.start
                && existing.period_end == period.end
        }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PayoutInvoice>> {
        let invoices = self.invoices.lock().unwrap();
        Ok(invoices.iter().find(|invoice| invoice.id == id).cloned())
    }

    async fn list(&self, filter: &PayoutListFilter) -> Result<Vec<PayoutInvoice>> {
        let invoices = self.invoices.lock().unwrap();
        let mut matched: Vec<PayoutInvoice> = invoices
            .iter()
            .filter(|invoice| {
                filter.status.map_or(true, |status| invoice.status == status)
                    && filter
                        .organization_id
                        .as_ref()
                        .map_or(true, |org| &invoice.organization_id == org)
                    && filter.search.as_ref().map_or(true, |needle| {
                        invoice.invoice_number.contains(needle)
                            || invoice.organization.name.contains(needle)
                    })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.unwrap_or(20).max(0) as usize;
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn transition_to_processing(&self, id: &str) -> Result<u64> {
        let mut invoices = self.invoices.lock().unwrap();
        match invoices
            .iter_mut()
            .find(|invoice| invoice.id == id && invoice.status == PayoutStatus::Pending)
        {
            Some(invoice) => {
                invoice.status = PayoutStatus::Processing;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn transition_to_paid(
        &self,
        id: &str,
        paid_at: DateTime<Utc>,
        payment_reference: Option<&str>,
        payment_notes: Option<&str>,
        paid_by: &str,
    ) -> Result<u64> {
        let mut invoices = self.invoices.lock().unwrap();
        match invoices
            .iter_mut()
            .find(|invoice| invoice.id == id && invoice.status.can_mark_paid())
        {
            Some(invoice) => {
                invoice.status = PayoutStatus::Paid;
                invoice.paid_at = Some(paid_at);
                invoice.payment_reference = payment_reference.map(str::to_string);
                invoice.payment_notes = payment_notes.map(str::to_string);
                invoice.paid_by = Some(paid_by.to_string());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn transition_to_pending(&self, id: &str) -> Result<u64> {
        let mut invoices = self.invoices.lock().unwrap();
        match invoices
            .iter_mut()
            .find(|invoice| invoice.id == id && invoice.status == PayoutStatus::Paid)
        {
            Some(invoice) => {
                invoice.status = PayoutStatus::Pending;
                invoice.paid_at = None;
                invoice.payment_reference = None;
                invoice.payment_notes = None;
                invoice.paid_by = None;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[derive(Default)]
pub struct InMemoryAuditRepository {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count_action(&self, action: AuditAction) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.action == action)
            .count()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Records confirmation events; can be told to fail to exercise the
/// best-effort contract.
pub struct RecordingNotifier {
    fail: bool,
    notified: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            fail: false,
            notified: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            notified: Mutex::new(Vec::new()),
        }
    }

    pub fn notified_invoice_ids(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentNotifier for RecordingNotifier {
    async fn payment_confirmed(&self, invoice: &PayoutInvoice) -> Result<()> {
        if self.fail {
            return Err(AppError::Notification(
                "notification endpoint unavailable".to_string(),
            ));
        }
        self.notified.lock().unwrap().push(invoice.id.clone());
        Ok(())
    }
}
