use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment state of a storefront order.
///
/// Only `Paid` orders are ever counted into a payout; refunds and
/// cancellations discovered after payment arrive as separate
/// `OrderAdjustmentEvent`s rather than rewriting the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Cancelled,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Who bears the cost of a voucher discount.
///
/// Seller-absorbed discounts reduce the seller's payout and are reported via
/// the invoice's `total_voucher_discount`; platform-absorbed discounts are
/// reimbursed to the seller as a positive payout adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    SellerAbsorbed,
    PlatformAbsorbed,
}

impl std::str::FromStr for VoucherKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "seller_absorbed" => Ok(VoucherKind::SellerAbsorbed),
            "platform_absorbed" => Ok(VoucherKind::PlatformAbsorbed),
            _ => Err(format!("Invalid voucher kind: {}", s)),
        }
    }
}

/// A storefront order, read-only to the payout engine.
///
/// `order_date` is the business date used for period attribution — never the
/// row's creation timestamp, because orders can be recorded after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub organization_id: String,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    /// Final order value, already net of any voucher discount applied at
    /// order time
    pub total_amount: Decimal,
    pub voucher_code: Option<String>,
    pub voucher_discount: Decimal,
    pub voucher_kind: Option<VoucherKind>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub variant_name: String,
    pub size: String,
    pub quantity: u32,
    /// Line total for this quantity at the sold price
    pub line_amount: Decimal,
}

impl Order {
    /// Total units across all line items
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn has_voucher(&self) -> bool {
        self.voucher_code.is_some()
    }
}

/// A post-payment correction to an order: a refund or cancellation recorded
/// within the reconciliation grace window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAdjustmentEvent {
    pub order_id: String,
    pub kind: AdjustmentKind,
    /// Positive magnitude of the correction
    pub amount: Decimal,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdjustmentKind {
    Refund,
    Cancellation,
}

impl std::fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustmentKind::Refund => write!(f, "REFUND"),
            AdjustmentKind::Cancellation => write!(f, "CANCELLATION"),
        }
    }
}
