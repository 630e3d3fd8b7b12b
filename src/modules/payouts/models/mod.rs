mod aggregation;
mod generation;
mod payout_invoice;

pub use aggregation::PayoutAggregate;
pub use generation::{GenerationOutcome, GenerationRunReport, OrganizationResult};
pub use payout_invoice::{
    OrderSnapshot, OrganizationSnapshot, PayoutAdjustment, PayoutAdjustmentKind, PayoutInvoice,
    PayoutStatus, ProductSummary, SizeSummary, VariantSummary,
};
