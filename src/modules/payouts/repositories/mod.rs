mod payout_invoice_repository;

pub use payout_invoice_repository::{
    InsertOutcome, MySqlPayoutInvoiceRepository, PayoutInvoiceRepository, PayoutListFilter,
};
