use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::core::{AppError, Result};
use crate::modules::payouts::models::PayoutInvoice;

type HmacSha256 = Hmac<Sha256>;

/// External notification collaborator signalled after a payout is confirmed.
///
/// Strictly fire-and-forget from the engine's perspective: delivery failure
/// is reported to the caller as a warning and never reverses the state
/// change that triggered it.
#[async_trait]
pub trait PaymentNotifier: Send + Sync {
    async fn payment_confirmed(&self, invoice: &PayoutInvoice) -> Result<()>;
}

/// Posts a signed confirmation event to the platform's notification service,
/// which owns the actual email templating and delivery.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
    secret: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: String, secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            secret,
        }
    }

    fn sign(&self, body: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::internal(format!("Invalid webhook secret: {}", e)))?;
        mac.update(body.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl PaymentNotifier for WebhookNotifier {
    async fn payment_confirmed(&self, invoice: &PayoutInvoice) -> Result<()> {
        let body = serde_json::to_string(&serde_json::json!({
            "event": "payout.paid",
            "invoice_id": invoice.id,
            "invoice_number": invoice.invoice_number,
            "organization_id": invoice.organization_id,
            "net_amount": invoice.net_amount.to_string(),
            "currency": invoice.currency.to_string(),
            "paid_at": invoice.paid_at.map(|at| at.to_rfc3339()),
        }))?;

        let signature = self.sign(&body)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("X-PayRun-Signature", signature)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("Webhook delivery failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Notification(format!(
                "Webhook endpoint returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Used when no notification endpoint is configured
pub struct NoopNotifier;

#[async_trait]
impl PaymentNotifier for NoopNotifier {
    async fn payment_confirmed(&self, invoice: &PayoutInvoice) -> Result<()> {
        tracing::debug!(
            invoice_id = %invoice.id,
            "No notification endpoint configured, skipping confirmation event"
        );
        Ok(())
    }
}
