use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::MySqlPool;
use std::sync::Arc;

use crate::core::Result;
use crate::modules::reports::models::PayoutSummary;
use crate::modules::reports::repositories::MySqlSummaryRepository;
use crate::modules::reports::services::SummaryService;

/// Response structure for the payout summary endpoint
#[derive(Debug, Serialize)]
pub struct PayoutSummaryResponse {
    pub pending_amount: String, // Decimal as string for JSON precision
    pub paid_amount: String,
    pub total_platform_fees: String,
    pub organization_count: i64,
    pub pending_count: i64,
    pub paid_count: i64,
}

impl From<PayoutSummary> for PayoutSummaryResponse {
    fn from(summary: PayoutSummary) -> Self {
        Self {
            pending_amount: summary.pending_amount.to_string(),
            paid_amount: summary.paid_amount.to_string(),
            total_platform_fees: summary.total_platform_fees.to_string(),
            organization_count: summary.organization_count,
            pending_count: summary.pending_count,
            paid_count: summary.paid_count,
        }
    }
}

/// GET /reports/payouts/summary
pub async fn payout_summary(pool: web::Data<MySqlPool>) -> Result<HttpResponse> {
    let repo = Arc::new(MySqlSummaryRepository::new(pool.get_ref().clone()));
    let service = SummaryService::new(repo);

    let summary = service.payout_summary().await?;

    Ok(HttpResponse::Ok().json(PayoutSummaryResponse::from(summary)))
}
