mod aggregation_service;
mod generation_service;
mod invoice_writer;
mod lifecycle_service;

pub use aggregation_service::AggregationService;
pub use generation_service::GenerationService;
pub use invoice_writer::{InvoiceWriter, WriteOutcome};
pub use lifecycle_service::{LifecycleService, MarkPaidReceipt};
