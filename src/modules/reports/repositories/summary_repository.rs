use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::reports::models::PayoutSummary;

/// Aggregate read over payout invoices for the admin dashboard
#[async_trait]
pub trait SummaryRepository: Send + Sync {
    async fn payout_summary(&self) -> Result<PayoutSummary>;
}

pub struct MySqlSummaryRepository {
    pool: MySqlPool,
}

impl MySqlSummaryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryRepository for MySqlSummaryRepository {
    async fn payout_summary(&self) -> Result<PayoutSummary> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status IN ('pending', 'processing') THEN net_amount END), 0) AS pending_amount,
                COALESCE(SUM(CASE WHEN status = 'paid' THEN net_amount END), 0) AS paid_amount,
                COALESCE(SUM(platform_fee_amount), 0) AS total_platform_fees,
                COUNT(DISTINCT organization_id) AS organization_count,
                CAST(COALESCE(SUM(CASE WHEN status IN ('pending', 'processing') THEN 1 ELSE 0 END), 0) AS SIGNED) AS pending_count,
                CAST(COALESCE(SUM(CASE WHEN status = 'paid' THEN 1 ELSE 0 END), 0) AS SIGNED) AS paid_count
            FROM payout_invoices
            WHERE status <> 'cancelled'
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(PayoutSummary {
            pending_amount: row.pending_amount,
            paid_amount: row.paid_amount,
            total_platform_fees: row.total_platform_fees,
            organization_count: row.organization_count,
            pending_count: row.pending_count,
            paid_count: row.paid_count,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    pending_amount: Decimal,
    paid_amount: Decimal,
    total_platform_fees: Decimal,
    organization_count: i64,
    pending_count: i64,
    paid_count: i64,
}
