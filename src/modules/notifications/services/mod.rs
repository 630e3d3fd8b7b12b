mod payment_notifier;

pub use payment_notifier::{NoopNotifier, PaymentNotifier, WebhookNotifier};
