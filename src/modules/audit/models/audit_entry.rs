use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actions recorded in the financial audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    InvoiceCreated,
    NegativeNetClamped,
    PayoutMarkedPaid,
    PayoutProcessing,
    PayoutReverted,
    GenerationRun,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::InvoiceCreated => "invoice_created",
            AuditAction::NegativeNetClamped => "negative_net_clamped",
            AuditAction::PayoutMarkedPaid => "payout_marked_paid",
            AuditAction::PayoutProcessing => "payout_processing",
            AuditAction::PayoutReverted => "payout_reverted",
            AuditAction::GenerationRun => "generation_run",
        };
        write!(f, "{}", s)
    }
}

/// One append-only audit record.
///
/// Every financial mutation writes an entry with the acting operator and a
/// JSON detail payload holding before/after amounts or statuses, so money
/// movements stay traceable regardless of later record state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub actor: String,
    pub action: AuditAction,
    pub invoice_id: Option<String>,
    pub organization_id: Option<String>,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        action: AuditAction,
        invoice_id: Option<String>,
        organization_id: Option<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            actor: actor.into(),
            action,
            invoice_id,
            organization_id,
            detail,
            created_at: Utc::now(),
        }
    }
}
