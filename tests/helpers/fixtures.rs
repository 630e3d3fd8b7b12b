use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use payrun::core::{Currency, PayoutPeriod};
use payrun::modules::orders::models::{
    AdjustmentKind, Order, OrderAdjustmentEvent, OrderItem, PaymentStatus, VoucherKind,
};
use payrun::modules::organizations::models::{BankDetails, Organization};

/// The completed window for a run on Wednesday 2026-08-05:
/// 2026-07-29 00:00:00.000 .. 2026-08-04 23:59:59.999 UTC
pub fn last_week() -> PayoutPeriod {
    PayoutPeriod::previous(Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap())
}

/// A timestamp safely inside `last_week`
pub fn mid_window() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 31, 12, 0, 0).unwrap()
}

pub fn organization(id: &str, fee_percentage: Decimal) -> Organization {
    Organization {
        id: id.to_string(),
        name: format!("Seller {}", id),
        currency: Currency::PHP,
        platform_fee_percentage: fee_percentage,
        bank_details: Some(BankDetails {
            bank_name: "BDO".to_string(),
            account_name: format!("Seller {}", id),
            account_number: "001234567890".to_string(),
        }),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn organization_without_bank(id: &str, fee_percentage: Decimal) -> Organization {
    Organization {
        bank_details: None,
        ..organization(id, fee_percentage)
    }
}

/// A paid single-item order; the item's line amount matches the order total
pub fn paid_order(
    id: &str,
    organization_id: &str,
    order_date: DateTime<Utc>,
    total_amount: Decimal,
) -> Order {
    Order {
        id: id.to_string(),
        order_number: format!("SO-{}", id),
        organization_id: organization_id.to_string(),
        customer_name: "Maria Santos".to_string(),
        order_date,
        payment_status: PaymentStatus::Paid,
        total_amount,
        voucher_code: None,
        voucher_discount: dec!(0),
        voucher_kind: None,
        items: vec![item("prod-default", "Classic Tee", "Black", "M", 1, total_amount)],
    }
}

pub fn item(
    product_id: &str,
    product_name: &str,
    variant_name: &str,
    size: &str,
    quantity: u32,
    line_amount: Decimal,
) -> OrderItem {
    OrderItem {
        product_id: product_id.to_string(),
        product_name: product_name.to_string(),
        variant_name: variant_name.to_string(),
        size: size.to_string(),
        quantity,
        line_amount,
    }
}

pub fn with_voucher(mut order: Order, code: &str, discount: Decimal, kind: VoucherKind) -> Order {
    order.voucher_code = Some(code.to_string());
    order.voucher_discount = discount;
    order.voucher_kind = Some(kind);
    order
}

pub fn refund_event(order_id: &str, amount: Decimal, reason: &str) -> OrderAdjustmentEvent {
    OrderAdjustmentEvent {
        order_id: order_id.to_string(),
        kind: AdjustmentKind::Refund,
        amount,
        reason: reason.to_string(),
        occurred_at: Utc.with_ymd_and_hms(2026, 8, 5, 8, 0, 0).unwrap(),
    }
}

pub fn cancellation_event(order_id: &str, amount: Decimal, reason: &str) -> OrderAdjustmentEvent {
    OrderAdjustmentEvent {
        order_id: order_id.to_string(),
        kind: AdjustmentKind::Cancellation,
        amount,
        reason: reason.to_string(),
        occurred_at: Utc.with_ymd_and_hms(2026, 8, 5, 8, 0, 0).unwrap(),
    }
}
