use std::sync::Arc;

use crate::core::{AppError, PayoutPeriod, Result};
use crate::modules::orders::repositories::OrderRepository;
use crate::modules::organizations::repositories::OrganizationRepository;
use crate::modules::payouts::models::PayoutAggregate;

/// Fetches one organization's window of orders and nets them into payout
/// figures.
///
/// Read-only: never mutates orders, so overlapping aggregations can run
/// concurrently without coordination.
pub struct AggregationService {
    organization_repo: Arc<dyn OrganizationRepository>,
    order_repo: Arc<dyn OrderRepository>,
}

impl AggregationService {
    pub fn new(
        organization_repo: Arc<dyn OrganizationRepository>,
        order_repo: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            organization_repo,
            order_repo,
        }
    }

    /// Aggregate one organization over one period.
    ///
    /// Returns `Ok(None)` when there is nothing to invoice. Missing bank
    /// details are reported but never block aggregation: the invoice can
    /// exist, payment confirmation simply waits for the details.
    pub async fn aggregate(
        &self,
        organization_id: &str,
        period: PayoutPeriod,
    ) -> Result<Option<PayoutAggregate>> {
        let organization = self
            .organization_repo
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Organization '{}' not found", organization_id))
            })?;

        if !organization.has_bank_details() {
            tracing::warn!(
                organization_id = %organization.id,
                "Organization has no bank details configured; payout cannot be confirmed until added"
            );
        }

        let orders = self
            .order_repo
            .find_paid_in_window(organization_id, &period)
            .await?;
        let adjustment_events = self
            .order_repo
            .find_adjustments_in_window(organization_id, &period)
            .await?;

        let aggregate = PayoutAggregate::build(&organization, period, &orders, &adjustment_events)?;

        if let Some(ref aggregate) = aggregate {
            tracing::info!(
                organization_id = %organization.id,
                period = %period,
                gross = %aggregate.gross_amount,
                net = %aggregate.net_amount,
                orders = aggregate.order_count,
                "Aggregated payout window"
            );
        }

        Ok(aggregate)
    }
}
