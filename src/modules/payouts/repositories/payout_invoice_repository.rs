use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::str::FromStr;

use crate::core::{AppError, Currency, PayoutPeriod, Result};
use crate::modules::payouts::models::{PayoutInvoice, PayoutStatus};

/// Result of an insert attempt against the one-active-invoice-per-period
/// uniqueness guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The unique key rejected the row: another invoice for this
    /// (organization, period) was committed first
    DuplicatePeriod,
}

#[derive(Debug, Clone, Default)]
pub struct PayoutListFilter {
    pub status: Option<PayoutStatus>,
    pub organization_id: Option<String>,
    /// Matches invoice number or organization name
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Storage for payout invoices.
///
/// Lifecycle transitions are single conditional UPDATEs: the statement's
/// `WHERE status` clause is the atomic read-modify-write boundary, and the
/// affected-row count tells the caller whether it won the transition.
#[async_trait]
pub trait PayoutInvoiceRepository: Send + Sync {
    async fn insert(&self, invoice: &PayoutInvoice) -> Result<InsertOutcome>;

    /// Whether a non-cancelled invoice already covers this exact period.
    async fn exists_for_period(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<bool>;

    async fn find_by_id(&self, id: &str) -> Result<Option<PayoutInvoice>>;

    async fn list(&self, filter: &PayoutListFilter) -> Result<Vec<PayoutInvoice>>;

    /// `Pending -> Processing`; returns affected rows (0 = lost the race or
    /// wrong state)
    async fn transition_to_processing(&self, id: &str) -> Result<u64>;

    /// `Pending|Processing -> Paid` with payment fields set
    async fn transition_to_paid(
        &self,
        id: &str,
        paid_at: DateTime<Utc>,
        payment_reference: Option<&str>,
        payment_notes: Option<&str>,
        paid_by: &str,
    ) -> Result<u64>;

    /// `Paid -> Pending` with payment fields cleared
    async fn transition_to_pending(&self, id: &str) -> Result<u64>;
}

pub struct MySqlPayoutInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlPayoutInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayoutInvoiceRepository for MySqlPayoutInvoiceRepository {
    async fn insert(&self, invoice: &PayoutInvoice) -> Result<InsertOutcome> {
        let organization_snapshot = serde_json::to_string(&invoice.organization)?;
        let adjustments = serde_json::to_string(&invoice.adjustments)?;
        let order_summary = serde_json::to_string(&invoice.order_summary)?;
        let product_summary = serde_json::to_string(&invoice.product_summary)?;

        let result = sqlx::query(
            r#"
            INSERT INTO payout_invoices (
                id, invoice_number, organization_id, organization_name,
                organization_snapshot, period_start, period_end, currency,
                gross_amount, platform_fee_percentage, platform_fee_amount,
                total_adjustment_amount, total_voucher_discount, net_amount,
                net_clamped, order_count, item_count,
                adjustments, order_summary, product_summary,
                status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.organization_id)
        .bind(&invoice.organization.name)
        .bind(organization_snapshot)
        .bind(invoice.period_start)
        .bind(invoice.period_end)
        .bind(invoice.currency.to_string())
        .bind(invoice.gross_amount)
        .bind(invoice.platform_fee_percentage)
        .bind(invoice.platform_fee_amount)
        .bind(invoice.total_adjustment_amount)
        .bind(invoice.total_voucher_discount)
        .bind(invoice.net_amount)
        .bind(invoice.net_clamped)
        .bind(invoice.order_count)
        .bind(invoice.item_count)
        .bind(adjustments)
        .bind(order_summary)
        .bind(product_summary)
        .bind(invoice.status.to_string())
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return Ok(InsertOutcome::DuplicatePeriod);
                    }
                }
                Err(AppError::Database(e))
            }
        }
    }

    async fn exists_for_period(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM payout_invoices
            WHERE organization_id = ?
              AND period_start = ?
              AND period_end = ?
              AND status <> 'cancelled'
            "#,
        )
        .bind(organization_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PayoutInvoice>> {
        let row = sqlx::query_as::<_, PayoutInvoiceRow>(
            r#"
            SELECT id, invoice_number, organization_id, organization_snapshot,
                   period_start, period_end, currency,
                   gross_amount, platform_fee_percentage, platform_fee_amount,
                   total_adjustment_amount, total_voucher_discount, net_amount,
                   net_clamped, order_count, item_count,
                   adjustments, order_summary, product_summary,
                   status, paid_at, payment_reference, payment_notes, paid_by,
                   created_at
            FROM payout_invoices
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        row.map(PayoutInvoiceRow::into_invoice).transpose()
    }

    async fn list(&self, filter: &PayoutListFilter) -> Result<Vec<PayoutInvoice>> {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            r#"
            SELECT id, invoice_number, organization_id, organization_snapshot,
                   period_start, period_end, currency,
                   gross_amount, platform_fee_percentage, platform_fee_amount,
                   total_adjustment_amount, total_voucher_discount, net_amount,
                   net_clamped, order_count, item_count,
                   adjustments, order_summary, product_summary,
                   status, paid_at, payment_reference, payment_notes, paid_by,
                   created_at
            FROM payout_invoices
            WHERE 1 = 1
            "#,
        );

        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.to_string());
        }
        if let Some(organization_id) = &filter.organization_id {
            builder.push(" AND organization_id = ");
            builder.push_bind(organization_id.clone());
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            builder.push(" AND (invoice_number LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR organization_name LIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(filter.limit.unwrap_or(20).clamp(1, 100));
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset.unwrap_or(0).max(0));

        let rows = builder
            .build_query_as::<PayoutInvoiceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        rows.into_iter().map(PayoutInvoiceRow::into_invoice).collect()
    }

    async fn transition_to_processing(&self, id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payout_invoices
            SET status = 'processing'
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    async fn transition_to_paid(
        &self,
        id: &str,
        paid_at: DateTime<Utc>,
        payment_reference: Option<&str>,
        payment_notes: Option<&str>,
        paid_by: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payout_invoices
            SET status = 'paid', paid_at = ?, payment_reference = ?,
                payment_notes = ?, paid_by = ?
            WHERE id = ? AND status IN ('pending', 'processing')
            "#,
        )
        .bind(paid_at)
        .bind(payment_reference)
        .bind(payment_notes)
        .bind(paid_by)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    async fn transition_to_pending(&self, id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payout_invoices
            SET status = 'pending', paid_at = NULL, payment_reference = NULL,
                payment_notes = NULL, paid_by = NULL
            WHERE id = ? AND status = 'paid'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PayoutInvoiceRow {
    id: String,
    invoice_number: String,
    organization_id: String,
    organization_snapshot: String,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    currency: String,
    gross_amount: Decimal,
    platform_fee_percentage: Decimal,
    platform_fee_amount: Decimal,
    total_adjustment_amount: Decimal,
    total_voucher_discount: Decimal,
    net_amount: Decimal,
    net_clamped: bool,
    order_count: u32,
    item_count: u32,
    adjustments: String,
    order_summary: String,
    product_summary: String,
    status: String,
    paid_at: Option<DateTime<Utc>>,
    payment_reference: Option<String>,
    payment_notes: Option<String>,
    paid_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl PayoutInvoiceRow {
    fn into_invoice(self) -> Result<PayoutInvoice> {
        let currency = Currency::from_str(&self.currency)
            .map_err(|e| AppError::internal(format!("Invalid currency in database: {}", e)))?;
        let status = PayoutStatus::from_str(&self.status)
            .map_err(|e| AppError::internal(format!("Invalid payout status in database: {}", e)))?;

        Ok(PayoutInvoice {
            id: self.id,
            invoice_number: self.invoice_number,
            organization_id: self.organization_id,
            organization: serde_json::from_str(&self.organization_snapshot)?,
            period_start: self.period_start,
            period_end: self.period_end,
            currency,
            gross_amount: self.gross_amount,
            platform_fee_percentage: self.platform_fee_percentage,
            platform_fee_amount: self.platform_fee_amount,
            total_adjustment_amount: self.total_adjustment_amount,
            total_voucher_discount: self.total_voucher_discount,
            net_amount: self.net_amount,
            net_clamped: self.net_clamped,
            order_count: self.order_count,
            item_count: self.item_count,
            adjustments: serde_json::from_str(&self.adjustments)?,
            order_summary: serde_json::from_str(&self.order_summary)?,
            product_summary: serde_json::from_str(&self.product_summary)?,
            status,
            paid_at: self.paid_at,
            payment_reference: self.payment_reference,
            payment_notes: self.payment_notes,
            paid_by: self.paid_by,
            created_at: self.created_at,
        })
    }
}
