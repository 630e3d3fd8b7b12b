mod payout_summary;

pub use payout_summary::PayoutSummary;
