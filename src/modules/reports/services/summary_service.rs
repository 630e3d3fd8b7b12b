use std::sync::Arc;
use tracing::info;

use crate::core::Result;
use crate::modules::reports::models::PayoutSummary;
use crate::modules::reports::repositories::SummaryRepository;

/// Service for the admin payout dashboard aggregates
pub struct SummaryService {
    summary_repo: Arc<dyn SummaryRepository>,
}

impl SummaryService {
    pub fn new(summary_repo: Arc<dyn SummaryRepository>) -> Self {
        Self { summary_repo }
    }

    /// Pending/paid amounts, total platform fees, and organization counts
    /// across all non-cancelled invoices.
    pub async fn payout_summary(&self) -> Result<PayoutSummary> {
        let summary = self.summary_repo.payout_summary().await?;

        info!(
            pending = %summary.pending_amount,
            paid = %summary.paid_amount,
            fees = %summary.total_platform_fees,
            organizations = summary.organization_count,
            "Payout summary generated"
        );

        Ok(summary)
    }
}
