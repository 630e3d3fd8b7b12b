use chrono::Utc;
use std::sync::Arc;

use crate::core::{AppError, Result};
use crate::modules::audit::models::{AuditAction, AuditEntry};
use crate::modules::audit::repositories::AuditRepository;
use crate::modules::notifications::services::PaymentNotifier;
use crate::modules::payouts::models::PayoutInvoice;
use crate::modules::payouts::repositories::PayoutInvoiceRepository;

/// Result of confirming a payout: the updated invoice plus whether the
/// best-effort confirmation notification went out.
#[derive(Debug)]
pub struct MarkPaidReceipt {
    pub invoice: PayoutInvoice,
    pub notification_sent: bool,
}

/// Drives invoices through `Pending -> Processing -> Paid` and the
/// administrative `Paid -> Pending` revert.
///
/// Every transition is one conditional UPDATE; when it affects zero rows the
/// current state is re-read to distinguish a missing invoice from an illegal
/// transition, and the stored record is left untouched either way.
pub struct LifecycleService {
    invoice_repo: Arc<dyn PayoutInvoiceRepository>,
    audit_repo: Arc<dyn AuditRepository>,
    notifier: Arc<dyn PaymentNotifier>,
}

impl LifecycleService {
    pub fn new(
        invoice_repo: Arc<dyn PayoutInvoiceRepository>,
        audit_repo: Arc<dyn AuditRepository>,
        notifier: Arc<dyn PaymentNotifier>,
    ) -> Self {
        Self {
            invoice_repo,
            audit_repo,
            notifier,
        }
    }

    /// Confirm a payout. Legal from `Pending` or `Processing`.
    ///
    /// The confirmation notification is fired after the state change commits
    /// and its failure never rolls the change back — it is reported through
    /// `notification_sent` instead.
    pub async fn mark_paid(
        &self,
        invoice_id: &str,
        payment_reference: Option<String>,
        payment_notes: Option<String>,
        operator: &str,
    ) -> Result<MarkPaidReceipt> {
        require_operator(operator, "confirm a payout")?;

        let paid_at = Utc::now();
        let affected = self
            .invoice_repo
            .transition_to_paid(
                invoice_id,
                paid_at,
                payment_reference.as_deref(),
                payment_notes.as_deref(),
                operator,
            )
            .await?;

        if affected == 0 {
            return Err(self.transition_rejection(invoice_id, "mark-paid").await);
        }

        let invoice = self.fetch_after_transition(invoice_id).await?;

        self.audit_repo
            .append(&AuditEntry::new(
                operator,
                AuditAction::PayoutMarkedPaid,
                Some(invoice.id.clone()),
                Some(invoice.organization_id.clone()),
                serde_json::json!({
                    "invoice_number": invoice.invoice_number,
                    "net_amount": invoice.net_amount.to_string(),
                    "payment_reference": payment_reference,
                    "payment_notes": payment_notes,
                    "paid_at": paid_at.to_rfc3339(),
                }),
            ))
            .await?;

        let notification_sent = match self.notifier.payment_confirmed(&invoice).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    invoice_id = %invoice.id,
                    error = %e,
                    "Payment confirmation notification failed; payout remains paid"
                );
                false
            }
        };

        tracing::info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            operator = %operator,
            notification_sent,
            "Payout marked paid"
        );

        Ok(MarkPaidReceipt {
            invoice,
            notification_sent,
        })
    }

    /// Record that the bank transfer was initiated. `Pending -> Processing`.
    pub async fn begin_processing(&self, invoice_id: &str, operator: &str) -> Result<PayoutInvoice> {
        require_operator(operator, "process a payout")?;

        let affected = self.invoice_repo.transition_to_processing(invoice_id).await?;
        if affected == 0 {
            return Err(self.transition_rejection(invoice_id, "process").await);
        }

        let invoice = self.fetch_after_transition(invoice_id).await?;

        self.audit_repo
            .append(&AuditEntry::new(
                operator,
                AuditAction::PayoutProcessing,
                Some(invoice.id.clone()),
                Some(invoice.organization_id.clone()),
                serde_json::json!({ "invoice_number": invoice.invoice_number }),
            ))
            .await?;

        Ok(invoice)
    }

    /// Administrative revert of a confirmed payout. Legal only from `Paid`;
    /// the reason is mandatory because this is a correcting, auditable
    /// action, not an undo.
    pub async fn revert_to_pending(
        &self,
        invoice_id: &str,
        reason: &str,
        operator: &str,
    ) -> Result<PayoutInvoice> {
        require_operator(operator, "revert a payout")?;
        if reason.trim().is_empty() {
            return Err(AppError::validation(
                "A non-empty reason is required to revert a paid payout",
            ));
        }

        // Capture the payment fields being cleared while the record is still
        // paid; a concurrent transition is caught by the CAS below
        let before = self
            .invoice_repo
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Payout invoice '{}' not found", invoice_id))
            })?;

        let affected = self.invoice_repo.transition_to_pending(invoice_id).await?;
        if affected == 0 {
            return Err(self.transition_rejection(invoice_id, "revert").await);
        }

        let invoice = self.fetch_after_transition(invoice_id).await?;

        self.audit_repo
            .append(&AuditEntry::new(
                operator,
                AuditAction::PayoutReverted,
                Some(invoice.id.clone()),
                Some(invoice.organization_id.clone()),
                serde_json::json!({
                    "invoice_number": invoice.invoice_number,
                    "reason": reason,
                    "cleared_payment_reference": before.payment_reference,
                    "cleared_paid_at": before.paid_at.map(|at| at.to_rfc3339()),
                    "cleared_paid_by": before.paid_by,
                }),
            ))
            .await?;

        tracing::info!(
            invoice_id = %invoice.id,
            operator = %operator,
            reason = %reason,
            "Payout reverted to pending"
        );

        Ok(invoice)
    }

    /// Zero rows affected: either the invoice does not exist or its current
    /// state forbids the transition. Re-read to report which.
    async fn transition_rejection(&self, invoice_id: &str, attempted: &str) -> AppError {
        match self.invoice_repo.find_by_id(invoice_id).await {
            Ok(Some(invoice)) => AppError::invalid_transition(invoice.status.to_string(), attempted),
            Ok(None) => AppError::not_found(format!("Payout invoice '{}' not found", invoice_id)),
            Err(e) => e,
        }
    }

    async fn fetch_after_transition(&self, invoice_id: &str) -> Result<PayoutInvoice> {
        self.invoice_repo
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Payout invoice '{}' vanished after transition",
                    invoice_id
                ))
            })
    }
}

fn require_operator(operator: &str, action: &str) -> Result<()> {
    if operator.trim().is_empty() {
        return Err(AppError::validation(format!(
            "An acting operator is required to {}",
            action
        )));
    }
    Ok(())
}
