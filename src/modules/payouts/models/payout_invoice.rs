use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Currency, PayoutPeriod, Result};
use crate::modules::orders::models::{AdjustmentKind, Order};
use crate::modules::organizations::models::{BankDetails, Organization};

use super::aggregation::PayoutAggregate;

/// Payout invoice lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Invoice created, payout not yet initiated
    Pending,

    /// Payment initiated with the bank, not yet confirmed
    Processing,

    /// Payout confirmed; reversible only through the administrative revert
    Paid,

    /// Terminal dead state, reachable only out-of-band; never blocks
    /// re-issuing the same period
    Cancelled,
}

impl PayoutStatus {
    /// States from which a payment confirmation is legal
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, PayoutStatus::Pending | PayoutStatus::Processing)
    }

    /// Only a confirmed payout can be reverted
    pub fn can_revert(&self) -> bool {
        matches!(self, PayoutStatus::Paid)
    }

    pub fn can_begin_processing(&self) -> bool {
        matches!(self, PayoutStatus::Pending)
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Pending => write!(f, "pending"),
            PayoutStatus::Processing => write!(f, "processing"),
            PayoutStatus::Paid => write!(f, "paid"),
            PayoutStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PayoutStatus::Pending),
            "processing" => Ok(PayoutStatus::Processing),
            "paid" => Ok(PayoutStatus::Paid),
            "cancelled" => Ok(PayoutStatus::Cancelled),
            _ => Err(format!("Invalid payout status: {}", s)),
        }
    }
}

/// Value-type copy of the organization taken at invoice creation.
///
/// The invoice must stay readable and accurate even if the organization is
/// renamed or its bank details change later, so this is never a live join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSnapshot {
    pub name: String,
    pub bank_details: Option<BankDetails>,
}

impl OrganizationSnapshot {
    pub fn of(organization: &Organization) -> Self {
        Self {
            name: organization.name.clone(),
            bank_details: organization.bank_details.clone(),
        }
    }
}

/// Point-in-time copy of one included order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub customer_name: String,
    pub item_count: u32,
    pub total_amount: Decimal,
    pub voucher_code: Option<String>,
    pub voucher_discount: Decimal,
}

impl OrderSnapshot {
    pub fn of(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            order_date: order.order_date,
            customer_name: order.customer_name.clone(),
            item_count: order.item_count(),
            total_amount: order.total_amount,
            voucher_code: order.voucher_code.clone(),
            voucher_discount: order.voucher_discount,
        }
    }
}

/// A signed correction applied to the period's payout, preserved for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAdjustment {
    pub order_id: String,
    pub kind: PayoutAdjustmentKind,
    /// Signed contribution: refunds/cancellations are negative,
    /// platform-funded voucher reimbursements positive
    pub amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutAdjustmentKind {
    Refund,
    Cancellation,
    VoucherReimbursement,
}

impl From<AdjustmentKind> for PayoutAdjustmentKind {
    fn from(kind: AdjustmentKind) -> Self {
        match kind {
            AdjustmentKind::Refund => PayoutAdjustmentKind::Refund,
            AdjustmentKind::Cancellation => PayoutAdjustmentKind::Cancellation,
        }
    }
}

/// Product → variant → size revenue breakdown, each level sorted by
/// descending amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub amount: Decimal,
    pub variants: Vec<VariantSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSummary {
    pub variant_name: String,
    pub quantity: u32,
    pub amount: Decimal,
    pub sizes: Vec<SizeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeSummary {
    pub size: String,
    pub quantity: u32,
    pub amount: Decimal,
}

/// The payout invoice: an immutable-once-created accounting record.
///
/// Created only by the invoice writer, mutated only through the lifecycle
/// transitions below, never deleted — cancellation is a status, not a
/// deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutInvoice {
    pub id: String,
    pub invoice_number: String,
    pub organization_id: String,
    pub organization: OrganizationSnapshot,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub currency: Currency,
    pub gross_amount: Decimal,
    pub platform_fee_percentage: Decimal,
    pub platform_fee_amount: Decimal,
    pub total_adjustment_amount: Decimal,
    pub total_voucher_discount: Decimal,
    pub net_amount: Decimal,
    /// True when the raw net computation fell below zero and was clamped —
    /// adjustments exceeding gross, a state requiring manual review
    pub net_clamped: bool,
    pub order_count: u32,
    pub item_count: u32,
    pub adjustments: Vec<PayoutAdjustment>,
    pub order_summary: Vec<OrderSnapshot>,
    pub product_summary: Vec<ProductSummary>,
    pub status: PayoutStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub payment_notes: Option<String>,
    pub paid_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PayoutInvoice {
    /// Materialize an invoice from an aggregation result.
    ///
    /// Status starts at `Pending`; financial figures are carried over
    /// verbatim from the aggregate, which already enforced the fee and
    /// netting identities.
    pub fn from_aggregate(aggregate: PayoutAggregate, invoice_number: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            organization_id: aggregate.organization_id,
            organization: aggregate.organization,
            period_start: aggregate.period.start,
            period_end: aggregate.period.end,
            currency: aggregate.currency,
            gross_amount: aggregate.gross_amount,
            platform_fee_percentage: aggregate.platform_fee_percentage,
            platform_fee_amount: aggregate.platform_fee_amount,
            total_adjustment_amount: aggregate.total_adjustment_amount,
            total_voucher_discount: aggregate.total_voucher_discount,
            net_amount: aggregate.net_amount,
            net_clamped: aggregate.net_clamped,
            order_count: aggregate.order_count,
            item_count: aggregate.item_count,
            adjustments: aggregate.adjustments,
            order_summary: aggregate.order_summary,
            product_summary: aggregate.product_summary,
            status: PayoutStatus::Pending,
            paid_at: None,
            payment_reference: None,
            payment_notes: None,
            paid_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn period(&self) -> PayoutPeriod {
        PayoutPeriod {
            start: self.period_start,
            end: self.period_end,
        }
    }

    /// Confirm the payout. Legal from `Pending` or `Processing`.
    pub fn mark_paid(
        &mut self,
        payment_reference: Option<String>,
        payment_notes: Option<String>,
        operator_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<()> {
        if operator_id.trim().is_empty() {
            return Err(AppError::validation(
                "A confirming operator is required to mark a payout paid",
            ));
        }
        if !self.status.can_mark_paid() {
            return Err(AppError::invalid_transition(
                self.status.to_string(),
                "mark-paid",
            ));
        }

        self.status = PayoutStatus::Paid;
        self.paid_at = Some(paid_at);
        self.payment_reference = payment_reference;
        self.payment_notes = payment_notes;
        self.paid_by = Some(operator_id.to_string());
        Ok(())
    }

    /// Record that a bank transfer was initiated but not yet confirmed.
    pub fn begin_processing(&mut self) -> Result<()> {
        if !self.status.can_begin_processing() {
            return Err(AppError::invalid_transition(
                self.status.to_string(),
                "process",
            ));
        }
        self.status = PayoutStatus::Processing;
        Ok(())
    }

    /// Administrative revert of a confirmed payout.
    ///
    /// The reason is mandatory: this is a correcting, auditable action
    /// (payment bounced, wrong amount sent), not a casual undo.
    pub fn revert_to_pending(&mut self, reason: &str) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(AppError::validation(
                "A non-empty reason is required to revert a paid payout",
            ));
        }
        if !self.status.can_revert() {
            return Err(AppError::invalid_transition(
                self.status.to_string(),
                "revert",
            ));
        }

        self.status = PayoutStatus::Pending;
        self.paid_at = None;
        self.payment_reference = None;
        self.payment_notes = None;
        self.paid_by = None;
        Ok(())
    }
}
