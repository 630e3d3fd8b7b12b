// Lifecycle state machine over in-memory repositories: mark-paid, process,
// revert, the illegal edges, and the best-effort confirmation notification.

use rust_decimal_macros::dec;
use std::sync::Arc;

use payrun::core::AppError;
use payrun::modules::audit::models::AuditAction;
use payrun::modules::payouts::models::{PayoutAggregate, PayoutInvoice, PayoutStatus};
use payrun::modules::payouts::repositories::{InsertOutcome, PayoutInvoiceRepository};
use payrun::modules::payouts::services::LifecycleService;

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::fixtures::{last_week, mid_window, organization, paid_order};
use helpers::memory::{
    InMemoryAuditRepository, InMemoryPayoutInvoiceRepository, RecordingNotifier,
};

struct Harness {
    invoices: Arc<InMemoryPayoutInvoiceRepository>,
    audit: Arc<InMemoryAuditRepository>,
    notifier: Arc<RecordingNotifier>,
    service: LifecycleService,
}

async fn harness_with_invoice(notifier: RecordingNotifier) -> (Harness, String) {
    let invoice_repo = Arc::new(InMemoryPayoutInvoiceRepository::new());
    let audit_repo = Arc::new(InMemoryAuditRepository::new());
    let notifier = Arc::new(notifier);

    let invoice = seeded_invoice();
    let invoice_id = invoice.id.clone();
    assert_eq!(
        invoice_repo.insert(&invoice).await.unwrap(),
        InsertOutcome::Inserted
    );

    let service = LifecycleService::new(
        invoice_repo.clone(),
        audit_repo.clone(),
        notifier.clone(),
    );

    (
        Harness {
            invoices: invoice_repo,
            audit: audit_repo,
            notifier,
            service,
        },
        invoice_id,
    )
}

/// A real pending invoice produced by the aggregation path
fn seeded_invoice() -> PayoutInvoice {
    let org = organization("org-1", dec!(15));
    let orders = vec![
        paid_order("o-1", "org-1", mid_window(), dec!(6000)),
        paid_order("o-2", "org-1", mid_window(), dec!(4000)),
    ];

    let aggregate = PayoutAggregate::build(&org, last_week(), &orders, &[])
        .unwrap()
        .unwrap();
    PayoutInvoice::from_aggregate(aggregate, "PV-20260804-TEST0001".to_string())
}

#[tokio::test]
async fn test_mark_paid_from_pending() {
    let (h, id) = harness_with_invoice(RecordingNotifier::new()).await;

    let receipt = h
        .service
        .mark_paid(
            &id,
            Some("BT-2026-001".to_string()),
            Some("weekly payout batch".to_string()),
            "op-1",
        )
        .await
        .unwrap();

    assert_eq!(receipt.invoice.status, PayoutStatus::Paid);
    assert!(receipt.invoice.paid_at.is_some());
    assert_eq!(receipt.invoice.payment_reference.as_deref(), Some("BT-2026-001"));
    assert_eq!(receipt.invoice.paid_by.as_deref(), Some("op-1"));
    assert!(receipt.notification_sent);

    assert_eq!(h.notifier.notified_invoice_ids(), vec![id]);
    assert_eq!(h.audit.count_action(AuditAction::PayoutMarkedPaid), 1);
}

#[tokio::test]
async fn test_mark_paid_twice_rejected_with_current_state() {
    let (h, id) = harness_with_invoice(RecordingNotifier::new()).await;

    h.service.mark_paid(&id, None, None, "op-1").await.unwrap();
    let before = serde_json::to_value(h.invoices.find_by_id(&id).await.unwrap()).unwrap();

    let err = h.service.mark_paid(&id, None, None, "op-2").await.unwrap_err();

    match err {
        AppError::InvalidStateTransition { current, attempted } => {
            assert_eq!(current, "paid");
            assert_eq!(attempted, "mark-paid");
        }
        other => panic!("expected InvalidStateTransition, got {:?}", other),
    }

    // The stored record is untouched by the rejected call
    let after = serde_json::to_value(h.invoices.find_by_id(&id).await.unwrap()).unwrap();
    assert_eq!(before, after);
    assert_eq!(h.notifier.notified_invoice_ids().len(), 1);
}

#[tokio::test]
async fn test_processing_then_paid() {
    let (h, id) = harness_with_invoice(RecordingNotifier::new()).await;

    let processing = h.service.begin_processing(&id, "op-1").await.unwrap();
    assert_eq!(processing.status, PayoutStatus::Processing);

    // A second process call is illegal from Processing
    let err = h.service.begin_processing(&id, "op-1").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    let receipt = h.service.mark_paid(&id, None, None, "op-1").await.unwrap();
    assert_eq!(receipt.invoice.status, PayoutStatus::Paid);

    assert_eq!(h.audit.count_action(AuditAction::PayoutProcessing), 1);
}

#[tokio::test]
async fn test_revert_from_pending_is_illegal() {
    let (h, id) = harness_with_invoice(RecordingNotifier::new()).await;
    let before = serde_json::to_value(h.invoices.find_by_id(&id).await.unwrap()).unwrap();

    let err = h
        .service
        .revert_to_pending(&id, "sent to wrong account", "op-1")
        .await
        .unwrap_err();

    match err {
        AppError::InvalidStateTransition { current, .. } => assert_eq!(current, "pending"),
        other => panic!("expected InvalidStateTransition, got {:?}", other),
    }

    let after = serde_json::to_value(h.invoices.find_by_id(&id).await.unwrap()).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_revert_requires_nonblank_reason() {
    let (h, id) = harness_with_invoice(RecordingNotifier::new()).await;
    h.service.mark_paid(&id, None, None, "op-1").await.unwrap();

    let err = h.service.revert_to_pending(&id, "   ", "op-1").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // No mutation happened
    let invoice = h.invoices.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(invoice.status, PayoutStatus::Paid);
}

#[tokio::test]
async fn test_revert_clears_payment_fields_and_audits_reason() {
    let (h, id) = harness_with_invoice(RecordingNotifier::new()).await;
    h.service
        .mark_paid(&id, Some("BT-9".to_string()), None, "op-1")
        .await
        .unwrap();

    let reverted = h
        .service
        .revert_to_pending(&id, "payment bounced", "op-2")
        .await
        .unwrap();

    assert_eq!(reverted.status, PayoutStatus::Pending);
    assert!(reverted.paid_at.is_none());
    assert!(reverted.payment_reference.is_none());
    assert!(reverted.payment_notes.is_none());
    assert!(reverted.paid_by.is_none());

    let entries = h.audit.entries();
    let revert_entry = entries
        .iter()
        .find(|entry| entry.action == AuditAction::PayoutReverted)
        .unwrap();
    assert_eq!(revert_entry.actor, "op-2");
    assert_eq!(revert_entry.detail["reason"], "payment bounced");
    assert_eq!(revert_entry.detail["cleared_payment_reference"], "BT-9");

    // The corrected payout can be confirmed again afterwards
    let receipt = h.service.mark_paid(&id, None, None, "op-3").await.unwrap();
    assert_eq!(receipt.invoice.status, PayoutStatus::Paid);
}

#[tokio::test]
async fn test_notification_failure_does_not_roll_back_payment() {
    let (h, id) = harness_with_invoice(RecordingNotifier::failing()).await;

    let receipt = h.service.mark_paid(&id, None, None, "op-1").await.unwrap();

    assert!(!receipt.notification_sent);
    assert_eq!(receipt.invoice.status, PayoutStatus::Paid);

    // The stored record is paid despite the failed notification
    let stored = h.invoices.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, PayoutStatus::Paid);
    assert_eq!(h.audit.count_action(AuditAction::PayoutMarkedPaid), 1);
}

#[tokio::test]
async fn test_unknown_invoice_is_not_found() {
    let (h, _id) = harness_with_invoice(RecordingNotifier::new()).await;

    let err = h
        .service
        .mark_paid("no-such-invoice", None, None, "op-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h
        .service
        .revert_to_pending("no-such-invoice", "reason", "op-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_blank_operator_rejected_before_any_transition() {
    let (h, id) = harness_with_invoice(RecordingNotifier::new()).await;

    let err = h.service.mark_paid(&id, None, None, "").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let invoice = h.invoices.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(invoice.status, PayoutStatus::Pending);
}
