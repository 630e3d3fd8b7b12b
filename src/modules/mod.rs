pub mod audit;
pub mod notifications;
pub mod orders;
pub mod organizations;
pub mod payouts;
pub mod reports;
