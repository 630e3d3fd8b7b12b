use std::sync::Arc;
use uuid::Uuid;

use crate::core::{PayoutPeriod, Result};
use crate::modules::audit::models::{AuditAction, AuditEntry};
use crate::modules::audit::repositories::AuditRepository;
use crate::modules::payouts::models::{PayoutAggregate, PayoutInvoice};
use crate::modules::payouts::repositories::{InsertOutcome, PayoutInvoiceRepository};

/// Outcome of persisting one aggregation result
#[derive(Debug)]
pub enum WriteOutcome {
    Created(PayoutInvoice),
    /// An invoice already covers this (organization, period); re-running the
    /// trigger is safe
    SkippedDuplicate,
}

/// Turns an aggregation result into a persisted, immutable invoice record,
/// guaranteeing at most one non-cancelled invoice per (organization, period).
pub struct InvoiceWriter {
    invoice_repo: Arc<dyn PayoutInvoiceRepository>,
    audit_repo: Arc<dyn AuditRepository>,
}

impl InvoiceWriter {
    pub fn new(
        invoice_repo: Arc<dyn PayoutInvoiceRepository>,
        audit_repo: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            invoice_repo,
            audit_repo,
        }
    }

    /// Persist the aggregate unless the period is already invoiced.
    ///
    /// The pre-check keeps the common re-run path cheap; the unique key on
    /// (organization, period) is what actually closes the check-then-insert
    /// race — a violation at commit also reports `SkippedDuplicate`.
    pub async fn write(&self, aggregate: PayoutAggregate, operator: &str) -> Result<WriteOutcome> {
        if self
            .invoice_repo
            .exists_for_period(&aggregate.organization_id, &aggregate.period)
            .await?
        {
            tracing::info!(
                organization_id = %aggregate.organization_id,
                period = %aggregate.period,
                "Invoice already exists for period, skipping"
            );
            return Ok(WriteOutcome::SkippedDuplicate);
        }

        let invoice_number = generate_invoice_number(&aggregate.period);
        let invoice = PayoutInvoice::from_aggregate(aggregate, invoice_number);

        match self.invoice_repo.insert(&invoice).await? {
            InsertOutcome::DuplicatePeriod => {
                tracing::info!(
                    organization_id = %invoice.organization_id,
                    "Lost invoice creation race, another run committed first"
                );
                Ok(WriteOutcome::SkippedDuplicate)
            }
            InsertOutcome::Inserted => {
                self.audit_repo
                    .append(&AuditEntry::new(
                        operator,
                        AuditAction::InvoiceCreated,
                        Some(invoice.id.clone()),
                        Some(invoice.organization_id.clone()),
                        serde_json::json!({
                            "invoice_number": invoice.invoice_number,
                            "period_start": invoice.period_start.to_rfc3339(),
                            "period_end": invoice.period_end.to_rfc3339(),
                            "gross_amount": invoice.gross_amount.to_string(),
                            "platform_fee_amount": invoice.platform_fee_amount.to_string(),
                            "total_adjustment_amount": invoice.total_adjustment_amount.to_string(),
                            "net_amount": invoice.net_amount.to_string(),
                            "order_count": invoice.order_count,
                        }),
                    ))
                    .await?;

                if invoice.net_clamped {
                    tracing::warn!(
                        invoice_id = %invoice.id,
                        organization_id = %invoice.organization_id,
                        gross = %invoice.gross_amount,
                        adjustments = %invoice.total_adjustment_amount,
                        "Net payout fell below zero and was clamped; manual review required"
                    );
                    self.audit_repo
                        .append(&AuditEntry::new(
                            operator,
                            AuditAction::NegativeNetClamped,
                            Some(invoice.id.clone()),
                            Some(invoice.organization_id.clone()),
                            serde_json::json!({
                                "gross_amount": invoice.gross_amount.to_string(),
                                "platform_fee_amount": invoice.platform_fee_amount.to_string(),
                                "total_adjustment_amount": invoice.total_adjustment_amount.to_string(),
                            }),
                        ))
                        .await?;
                }

                tracing::info!(
                    invoice_id = %invoice.id,
                    invoice_number = %invoice.invoice_number,
                    organization_id = %invoice.organization_id,
                    net = %invoice.net_amount,
                    "Payout invoice created"
                );

                Ok(WriteOutcome::Created(invoice))
            }
        }
    }
}

/// `PV-<period-end date>-<8 hex>`: unique platform-wide (enforced by the
/// database key), the date component aids human lookup.
fn generate_invoice_number(period: &PayoutPeriod) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "PV-{}-{}",
        period.end.format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}
