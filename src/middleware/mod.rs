pub mod auth;
pub mod request_id;

pub use auth::{token_digest, OperatorAuth, OperatorContext};
pub use request_id::RequestId;
