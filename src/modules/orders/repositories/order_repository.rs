use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::str::FromStr;

use crate::core::{AppError, PayoutPeriod, Result};
use crate::modules::orders::models::{
    AdjustmentKind, Order, OrderAdjustmentEvent, OrderItem, PaymentStatus, VoucherKind,
};

/// Read-only access to storefront orders.
///
/// The payout engine never writes through this interface; aggregations over
/// the same window are therefore safe to run concurrently.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Paid orders for one organization whose business `order_date` falls
    /// inside the window (inclusive both ends), line items included.
    async fn find_paid_in_window(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<Vec<Order>>;

    /// Refund/cancellation events against orders of the window.
    async fn find_adjustments_in_window(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<Vec<OrderAdjustmentEvent>>;

    /// Distinct organizations with at least one qualifying paid order.
    async fn organizations_with_paid_orders(&self, period: &PayoutPeriod) -> Result<Vec<String>>;
}

pub struct MySqlOrderRepository {
    pool: MySqlPool,
}

impl MySqlOrderRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn find_paid_in_window(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<Vec<Order>> {
        let order_rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, order_number, organization_id, customer_name, order_date,
                   payment_status, total_amount, voucher_code, voucher_discount,
                   voucher_kind
            FROM orders
            WHERE organization_id = ?
              AND payment_status = 'paid'
              AND order_date BETWEEN ? AND ?
            ORDER BY order_date, id
            "#,
        )
        .bind(organization_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if order_rows.is_empty() {
            return Ok(Vec::new());
        }

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT oi.order_id, oi.product_id, oi.product_name, oi.variant_name,
                   oi.size, oi.quantity, oi.line_amount
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.organization_id = ?
              AND o.payment_status = 'paid'
              AND o.order_date BETWEEN ? AND ?
            ORDER BY oi.order_id, oi.id
            "#,
        )
        .bind(organization_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id.clone())
                .or_default()
                .push(row.into_item());
        }

        order_rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    async fn find_adjustments_in_window(
        &self,
        organization_id: &str,
        period: &PayoutPeriod,
    ) -> Result<Vec<OrderAdjustmentEvent>> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT e.order_id, e.kind, e.amount, e.reason, e.occurred_at
            FROM order_adjustment_events e
            JOIN orders o ON o.id = e.order_id
            WHERE o.organization_id = ?
              AND o.order_date BETWEEN ? AND ?
            ORDER BY e.occurred_at, e.id
            "#,
        )
        .bind(organization_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        rows.into_iter().map(AdjustmentRow::into_event).collect()
    }

    async fn organizations_with_paid_orders(&self, period: &PayoutPeriod) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT organization_id
            FROM orders
            WHERE payment_status = 'paid'
              AND order_date BETWEEN ? AND ?
            ORDER BY organization_id
            "#,
        )
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    organization_id: String,
    customer_name: String,
    order_date: chrono::DateTime<chrono::Utc>,
    payment_status: String,
    total_amount: Decimal,
    voucher_code: Option<String>,
    voucher_discount: Decimal,
    voucher_kind: Option<String>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order> {
        let payment_status = PaymentStatus::from_str(&self.payment_status)
            .map_err(|e| AppError::internal(format!("Invalid payment status in database: {}", e)))?;

        let voucher_kind = self
            .voucher_kind
            .as_deref()
            .map(VoucherKind::from_str)
            .transpose()
            .map_err(|e| AppError::internal(format!("Invalid voucher kind in database: {}", e)))?;

        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            organization_id: self.organization_id,
            customer_name: self.customer_name,
            order_date: self.order_date,
            payment_status,
            total_amount: self.total_amount,
            voucher_code: self.voucher_code,
            voucher_discount: self.voucher_discount,
            voucher_kind,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: String,
    product_id: String,
    product_name: String,
    variant_name: String,
    size: String,
    quantity: u32,
    line_amount: Decimal,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            product_id: self.product_id,
            product_name: self.product_name,
            variant_name: self.variant_name,
            size: self.size,
            quantity: self.quantity,
            line_amount: self.line_amount,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdjustmentRow {
    order_id: String,
    kind: String,
    amount: Decimal,
    reason: String,
    occurred_at: chrono::DateTime<chrono::Utc>,
}

impl AdjustmentRow {
    fn into_event(self) -> Result<OrderAdjustmentEvent> {
        let kind = match self.kind.as_str() {
            "REFUND" => AdjustmentKind::Refund,
            "CANCELLATION" => AdjustmentKind::Cancellation,
            other => {
                return Err(AppError::internal(format!(
                    "Invalid adjustment kind in database: {}",
                    other
                )))
            }
        };

        Ok(OrderAdjustmentEvent {
            order_id: self.order_id,
            kind,
            amount: self.amount,
            reason: self.reason,
            occurred_at: self.occurred_at,
        })
    }
}
