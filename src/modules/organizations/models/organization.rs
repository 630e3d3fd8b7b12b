use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};

/// A seller tenant receiving weekly payouts.
///
/// Read-only to the payout engine: fee percentage and bank details are
/// snapshotted into the invoice at creation time and never re-joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// Settlement currency for this organization's payouts
    pub currency: Currency,
    /// Platform fee as a percentage of gross, e.g. 15 for 15%
    pub platform_fee_percentage: Decimal,
    /// Absent until the seller configures payout banking; invoices are still
    /// generated without it, payment confirmation just cannot happen yet.
    pub bank_details: Option<BankDetails>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
}

impl Organization {
    /// The fee percentage to snapshot, validated against business bounds.
    pub fn validated_fee_percentage(&self) -> Result<Decimal> {
        if self.platform_fee_percentage < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Organization '{}' has a negative platform fee percentage ({})",
                self.id, self.platform_fee_percentage
            )));
        }
        if self.platform_fee_percentage > Decimal::from(100) {
            return Err(AppError::validation(format!(
                "Organization '{}' has a platform fee percentage above 100 ({})",
                self.id, self.platform_fee_percentage
            )));
        }
        Ok(self.platform_fee_percentage)
    }

    pub fn has_bank_details(&self) -> bool {
        self.bank_details.is_some()
    }
}
