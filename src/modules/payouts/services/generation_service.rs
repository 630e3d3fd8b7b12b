use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{AppError, PayoutPeriod, Result};
use crate::modules::audit::models::{AuditAction, AuditEntry};
use crate::modules::audit::repositories::AuditRepository;
use crate::modules::orders::repositories::OrderRepository;
use crate::modules::payouts::models::{
    GenerationOutcome, GenerationRunReport, OrganizationResult,
};

use super::aggregation_service::AggregationService;
use super::invoice_writer::{InvoiceWriter, WriteOutcome};

/// The operator-invoked entry point: runs aggregation + writer for every
/// organization with qualifying orders in an explicit period.
///
/// A scheduled weekly caller, if one is ever deployed, goes through this
/// same function with `PayoutPeriod::previous(now)` bounds.
pub struct GenerationService {
    order_repo: Arc<dyn OrderRepository>,
    audit_repo: Arc<dyn AuditRepository>,
    aggregation: Arc<AggregationService>,
    writer: Arc<InvoiceWriter>,
}

impl GenerationService {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        audit_repo: Arc<dyn AuditRepository>,
        aggregation: Arc<AggregationService>,
        writer: Arc<InvoiceWriter>,
    ) -> Self {
        Self {
            order_repo,
            audit_repo,
            aggregation,
            writer,
        }
    }

    /// Generate invoices for every organization active in the period.
    ///
    /// Organizations are processed sequentially and independently: one
    /// organization's error is captured in its result and never aborts the
    /// rest of the run. The optional `max_duration` is checked between
    /// organizations only, so an in-flight write is never interrupted;
    /// expiry is reported through `completed = false`.
    pub async fn generate_for_period(
        &self,
        period: PayoutPeriod,
        operator: &str,
        max_duration: Option<Duration>,
    ) -> Result<GenerationRunReport> {
        if operator.trim().is_empty() {
            return Err(AppError::validation(
                "A triggering operator is required for a generation run",
            ));
        }

        let started = Instant::now();
        let organizations = self.order_repo.organizations_with_paid_orders(&period).await?;

        tracing::info!(
            period = %period,
            organizations = organizations.len(),
            operator = %operator,
            "Starting payout generation run"
        );

        let mut results: Vec<OrganizationResult> = Vec::new();
        let mut invoices_created: u32 = 0;
        let mut completed = true;

        for organization_id in organizations {
            if let Some(max) = max_duration {
                if started.elapsed() >= max {
                    tracing::warn!(
                        period = %period,
                        processed = results.len(),
                        "Generation run deadline reached, stopping before remaining organizations"
                    );
                    completed = false;
                    break;
                }
            }

            let outcome = match self.process_organization(&organization_id, period, operator).await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        organization_id = %organization_id,
                        error = %e,
                        "Payout generation failed for organization"
                    );
                    GenerationOutcome::Error {
                        message: e.to_string(),
                    }
                }
            };

            if matches!(outcome, GenerationOutcome::Created { .. }) {
                invoices_created += 1;
            }
            results.push(OrganizationResult {
                organization_id,
                outcome,
            });
        }

        let report = GenerationRunReport {
            period,
            invoices_created,
            completed,
            results,
        };

        self.audit_repo
            .append(&AuditEntry::new(
                operator,
                AuditAction::GenerationRun,
                None,
                None,
                serde_json::json!({
                    "period_start": period.start.to_rfc3339(),
                    "period_end": period.end.to_rfc3339(),
                    "invoices_created": report.invoices_created,
                    "skipped_duplicate": report.skipped_duplicates(),
                    "errors": report.errors(),
                    "completed": report.completed,
                }),
            ))
            .await?;

        tracing::info!(
            period = %period,
            created = report.invoices_created,
            skipped = report.skipped_duplicates(),
            errors = report.errors(),
            completed = report.completed,
            "Payout generation run finished"
        );

        Ok(report)
    }

    /// aggregate -> check-duplicate -> write, strictly sequential for one
    /// organization's period
    async fn process_organization(
        &self,
        organization_id: &str,
        period: PayoutPeriod,
        operator: &str,
    ) -> Result<GenerationOutcome> {
        let aggregate = match self.aggregation.aggregate(organization_id, period).await? {
            Some(aggregate) => aggregate,
            // Enumeration said this organization had orders; if they are gone
            // by the time we aggregate, skip rather than write a zero invoice
            None => return Ok(GenerationOutcome::SkippedNoOrders),
        };

        match self.writer.write(aggregate, operator).await? {
            WriteOutcome::Created(invoice) => Ok(GenerationOutcome::Created {
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number,
            }),
            WriteOutcome::SkippedDuplicate => Ok(GenerationOutcome::SkippedDuplicate),
        }
    }
}
