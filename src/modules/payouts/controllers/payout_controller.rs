use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::core::{AppError, PayoutPeriod, Result};
use crate::middleware::OperatorContext;
use crate::modules::audit::repositories::MySqlAuditRepository;
use crate::modules::notifications::services::{NoopNotifier, PaymentNotifier, WebhookNotifier};
use crate::modules::orders::repositories::MySqlOrderRepository;
use crate::modules::organizations::repositories::MySqlOrganizationRepository;
use crate::modules::payouts::models::{
    GenerationRunReport, OrderSnapshot, PayoutAdjustment, PayoutInvoice, PayoutStatus,
    ProductSummary,
};
use crate::modules::payouts::repositories::{
    MySqlPayoutInvoiceRepository, PayoutInvoiceRepository, PayoutListFilter,
};
use crate::modules::payouts::services::{
    AggregationService, GenerationService, InvoiceWriter, LifecycleService,
};

/// POST /payouts/generate request body
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Optional wall-clock budget; the run stops scheduling further
    /// organizations once it is spent
    pub time_budget_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub payment_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    pub reason: String,
}

/// Lightweight row for the list view (no embedded summaries)
#[derive(Debug, Serialize)]
pub struct PayoutListItem {
    pub id: String,
    pub invoice_number: String,
    pub organization_id: String,
    pub organization_name: String,
    pub period_start: String,
    pub period_end: String,
    pub currency: String,
    pub gross_amount: String,
    pub net_amount: String,
    pub status: PayoutStatus,
    pub order_count: u32,
    pub paid_at: Option<String>,
    pub created_at: String,
}

impl From<PayoutInvoice> for PayoutListItem {
    fn from(invoice: PayoutInvoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            organization_id: invoice.organization_id,
            organization_name: invoice.organization.name,
            period_start: invoice.period_start.to_rfc3339(),
            period_end: invoice.period_end.to_rfc3339(),
            currency: invoice.currency.to_string(),
            gross_amount: invoice.gross_amount.to_string(),
            net_amount: invoice.net_amount.to_string(),
            status: invoice.status,
            order_count: invoice.order_count,
            paid_at: invoice.paid_at.map(|at| at.to_rfc3339()),
            created_at: invoice.created_at.to_rfc3339(),
        }
    }
}

/// Full invoice detail: the shape the document renderer consumes.
///
/// Amounts are strings to keep JSON precision; the snapshots are the
/// denormalized copies taken at creation, never live joins.
#[derive(Debug, Serialize)]
pub struct PayoutDetailResponse {
    pub id: String,
    pub invoice_number: String,
    pub organization_id: String,
    pub organization: crate::modules::payouts::models::OrganizationSnapshot,
    pub period_start: String,
    pub period_end: String,
    pub currency: String,
    pub gross_amount: String,
    pub platform_fee_percentage: String,
    pub platform_fee_amount: String,
    pub total_adjustment_amount: String,
    pub total_voucher_discount: String,
    pub net_amount: String,
    pub net_clamped: bool,
    pub order_count: u32,
    pub item_count: u32,
    pub adjustments: Vec<PayoutAdjustment>,
    pub order_summary: Vec<OrderSnapshot>,
    pub product_summary: Vec<ProductSummary>,
    pub status: PayoutStatus,
    pub paid_at: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_notes: Option<String>,
    pub paid_by: Option<String>,
    pub created_at: String,
}

impl From<PayoutInvoice> for PayoutDetailResponse {
    fn from(invoice: PayoutInvoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            organization_id: invoice.organization_id,
            organization: invoice.organization,
            period_start: invoice.period_start.to_rfc3339(),
            period_end: invoice.period_end.to_rfc3339(),
            currency: invoice.currency.to_string(),
            gross_amount: invoice.gross_amount.to_string(),
            platform_fee_percentage: invoice.platform_fee_percentage.to_string(),
            platform_fee_amount: invoice.platform_fee_amount.to_string(),
            total_adjustment_amount: invoice.total_adjustment_amount.to_string(),
            total_voucher_discount: invoice.total_voucher_discount.to_string(),
            net_amount: invoice.net_amount.to_string(),
            net_clamped: invoice.net_clamped,
            order_count: invoice.order_count,
            item_count: invoice.item_count,
            adjustments: invoice.adjustments,
            order_summary: invoice.order_summary,
            product_summary: invoice.product_summary,
            status: invoice.status,
            paid_at: invoice.paid_at.map(|at| at.to_rfc3339()),
            payment_reference: invoice.payment_reference,
            payment_notes: invoice.payment_notes,
            paid_by: invoice.paid_by,
            created_at: invoice.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkPaidResponse {
    pub invoice: PayoutDetailResponse,
    pub notification_sent: bool,
}

/// POST /payouts/generate
///
/// Runs aggregation + writer for an explicit period. Safe to re-run: already
/// invoiced organizations report `skipped_duplicate`.
pub async fn generate(
    pool: web::Data<MySqlPool>,
    operator: OperatorContext,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse> {
    let period = PayoutPeriod::manual(body.period_start, body.period_end)?;
    let max_duration = body.time_budget_seconds.map(Duration::from_secs);

    let report: GenerationRunReport = generation_service(&pool)
        .generate_for_period(period, &operator.id, max_duration)
        .await?;

    Ok(HttpResponse::Ok().json(report))
}

/// GET /payouts
pub async fn list(
    pool: web::Data<MySqlPool>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<PayoutStatus>)
        .transpose()
        .map_err(AppError::Validation)?;

    let filter = PayoutListFilter {
        status,
        organization_id: query.organization_id.clone(),
        search: query.search.clone(),
        limit: query.limit,
        offset: query.offset,
    };

    let repo = MySqlPayoutInvoiceRepository::new(pool.get_ref().clone());
    let invoices = repo.list(&filter).await?;

    let items: Vec<PayoutListItem> = invoices.into_iter().map(PayoutListItem::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /payouts/{id}
pub async fn detail(pool: web::Data<MySqlPool>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();

    let repo = MySqlPayoutInvoiceRepository::new(pool.get_ref().clone());
    let invoice = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Payout invoice '{}' not found", id)))?;

    Ok(HttpResponse::Ok().json(PayoutDetailResponse::from(invoice)))
}

/// POST /payouts/{id}/mark-paid
pub async fn mark_paid(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    operator: OperatorContext,
    path: web::Path<String>,
    body: web::Json<MarkPaidRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let body = body.into_inner();

    let receipt = lifecycle_service(&pool, &config)
        .mark_paid(&id, body.payment_reference, body.payment_notes, &operator.id)
        .await?;

    Ok(HttpResponse::Ok().json(MarkPaidResponse {
        invoice: PayoutDetailResponse::from(receipt.invoice),
        notification_sent: receipt.notification_sent,
    }))
}

/// POST /payouts/{id}/process
pub async fn begin_processing(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    operator: OperatorContext,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();

    let invoice = lifecycle_service(&pool, &config)
        .begin_processing(&id, &operator.id)
        .await?;

    Ok(HttpResponse::Ok().json(PayoutDetailResponse::from(invoice)))
}

/// POST /payouts/{id}/revert
pub async fn revert(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    operator: OperatorContext,
    path: web::Path<String>,
    body: web::Json<RevertRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();

    let invoice = lifecycle_service(&pool, &config)
        .revert_to_pending(&id, &body.reason, &operator.id)
        .await?;

    Ok(HttpResponse::Ok().json(PayoutDetailResponse::from(invoice)))
}

fn generation_service(pool: &MySqlPool) -> GenerationService {
    let organization_repo = Arc::new(MySqlOrganizationRepository::new(pool.clone()));
    let order_repo = Arc::new(MySqlOrderRepository::new(pool.clone()));
    let invoice_repo = Arc::new(MySqlPayoutInvoiceRepository::new(pool.clone()));
    let audit_repo = Arc::new(MySqlAuditRepository::new(pool.clone()));

    let aggregation = Arc::new(AggregationService::new(organization_repo, order_repo.clone()));
    let writer = Arc::new(InvoiceWriter::new(invoice_repo, audit_repo.clone()));

    GenerationService::new(order_repo, audit_repo, aggregation, writer)
}

fn lifecycle_service(pool: &MySqlPool, config: &Config) -> LifecycleService {
    let invoice_repo = Arc::new(MySqlPayoutInvoiceRepository::new(pool.clone()));
    let audit_repo = Arc::new(MySqlAuditRepository::new(pool.clone()));

    let notifier: Arc<dyn PaymentNotifier> = match &config.notifications.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            config.notifications.webhook_secret.clone(),
        )),
        None => Arc::new(NoopNotifier),
    };

    LifecycleService::new(invoice_repo, audit_repo, notifier)
}
