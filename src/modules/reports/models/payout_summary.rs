use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Admin dashboard aggregate over all payout invoices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutSummary {
    /// Sum of `net_amount` over pending and processing invoices
    pub pending_amount: Decimal,
    /// Sum of `net_amount` over paid invoices
    pub paid_amount: Decimal,
    /// Sum of `platform_fee_amount` over all non-cancelled invoices
    pub total_platform_fees: Decimal,
    /// Distinct organizations with at least one non-cancelled invoice
    pub organization_count: i64,
    pub pending_count: i64,
    pub paid_count: i64,
}

impl PayoutSummary {
    pub fn empty() -> Self {
        Self {
            pending_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            total_platform_fees: Decimal::ZERO,
            organization_count: 0,
            pending_count: 0,
            paid_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.organization_count == 0
    }
}
