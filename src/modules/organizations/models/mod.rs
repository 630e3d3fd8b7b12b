mod organization;

pub use organization::{BankDetails, Organization};
