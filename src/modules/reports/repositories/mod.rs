mod summary_repository;

pub use summary_repository::{MySqlSummaryRepository, SummaryRepository};
