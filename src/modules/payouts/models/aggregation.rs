use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::{Currency, PayoutPeriod, Result};
use crate::modules::orders::models::{Order, OrderAdjustmentEvent, PaymentStatus, VoucherKind};
use crate::modules::organizations::models::Organization;

use super::payout_invoice::{
    OrderSnapshot, OrganizationSnapshot, PayoutAdjustment, PayoutAdjustmentKind, ProductSummary,
    SizeSummary, VariantSummary,
};

/// The result of netting one organization's paid orders over one period.
///
/// Pure and deterministic: built from already-fetched rows, touches no
/// storage, mutates nothing. The invoice writer turns it into a persisted
/// `PayoutInvoice` verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAggregate {
    pub organization_id: String,
    pub organization: OrganizationSnapshot,
    pub period: PayoutPeriod,
    pub currency: Currency,
    pub gross_amount: Decimal,
    pub platform_fee_percentage: Decimal,
    pub platform_fee_amount: Decimal,
    pub total_adjustment_amount: Decimal,
    pub total_voucher_discount: Decimal,
    pub net_amount: Decimal,
    pub net_clamped: bool,
    pub order_count: u32,
    pub item_count: u32,
    pub adjustments: Vec<PayoutAdjustment>,
    pub order_summary: Vec<OrderSnapshot>,
    pub product_summary: Vec<ProductSummary>,
}

impl PayoutAggregate {
    /// Net one organization's window of orders into payout figures.
    ///
    /// Returns `Ok(None)` when no qualifying orders exist — the caller must
    /// skip invoice creation rather than write a zero invoice.
    ///
    /// Orders are re-filtered here even though repositories already filter:
    /// inclusion is a money-correctness invariant (`PAID` + `order_date`
    /// inside the inclusive window), not a query optimization.
    pub fn build(
        organization: &Organization,
        period: PayoutPeriod,
        orders: &[Order],
        adjustment_events: &[OrderAdjustmentEvent],
    ) -> Result<Option<Self>> {
        let fee_percentage = organization.validated_fee_percentage()?;
        let currency = organization.currency;

        let mut included: Vec<&Order> = orders
            .iter()
            .filter(|order| {
                order.payment_status == PaymentStatus::Paid && period.contains(order.order_date)
            })
            .collect();

        if included.is_empty() {
            return Ok(None);
        }

        included.sort_by(|a, b| (a.order_date, &a.id).cmp(&(b.order_date, &b.id)));
        let included_ids: HashSet<&str> =
            included.iter().map(|order| order.id.as_str()).collect();

        let mut gross_amount = Decimal::ZERO;
        let mut total_voucher_discount = Decimal::ZERO;
        let mut item_count: u32 = 0;
        let mut voucher_reimbursements: Vec<PayoutAdjustment> = Vec::new();

        for order in &included {
            gross_amount += order.total_amount;
            item_count += order.item_count();

            match order.voucher_kind {
                Some(VoucherKind::SellerAbsorbed) => {
                    total_voucher_discount += order.voucher_discount;
                }
                Some(VoucherKind::PlatformAbsorbed) if order.voucher_discount > Decimal::ZERO => {
                    let code = order.voucher_code.as_deref().unwrap_or("(unknown)");
                    voucher_reimbursements.push(PayoutAdjustment {
                        order_id: order.id.clone(),
                        kind: PayoutAdjustmentKind::VoucherReimbursement,
                        amount: order.voucher_discount,
                        reason: format!("Platform-funded voucher {}", code),
                    });
                }
                _ => {}
            }
        }

        // Corrections for orders outside the window belong to that window's
        // invoice, never this one
        let mut adjustments: Vec<PayoutAdjustment> = adjustment_events
            .iter()
            .filter(|event| included_ids.contains(event.order_id.as_str()))
            .map(|event| PayoutAdjustment {
                order_id: event.order_id.clone(),
                kind: PayoutAdjustmentKind::from(event.kind),
                amount: -event.amount,
                reason: event.reason.clone(),
            })
            .collect();
        adjustments.extend(voucher_reimbursements);

        let total_adjustment_amount: Decimal =
            adjustments.iter().map(|adjustment| adjustment.amount).sum();

        let platform_fee_amount =
            currency.round_half_up(gross_amount * fee_percentage / Decimal::from(100));

        let raw_net = gross_amount - platform_fee_amount + total_adjustment_amount;
        let (net_amount, net_clamped) = if raw_net < Decimal::ZERO {
            (Decimal::ZERO, true)
        } else {
            (raw_net, false)
        };

        let order_summary: Vec<OrderSnapshot> =
            included.iter().map(|order| OrderSnapshot::of(order)).collect();
        let product_summary = build_product_summary(&included);

        Ok(Some(Self {
            organization_id: organization.id.clone(),
            organization: OrganizationSnapshot::of(organization),
            period,
            currency,
            gross_amount,
            platform_fee_percentage: fee_percentage,
            platform_fee_amount,
            total_adjustment_amount,
            total_voucher_discount,
            net_amount,
            net_clamped,
            order_count: included.len() as u32,
            item_count,
            adjustments,
            order_summary,
            product_summary,
        }))
    }
}

/// Group line items product → variant → size, summing quantity and amount at
/// every level. Each level is sorted by descending amount; the sorts are
/// stable, so ties keep insertion order.
fn build_product_summary(orders: &[&Order]) -> Vec<ProductSummary> {
    let mut products: Vec<ProductSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for order in orders {
        for item in &order.items {
            let product_pos = *index.entry(item.product_id.clone()).or_insert_with(|| {
                products.push(ProductSummary {
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    quantity: 0,
                    amount: Decimal::ZERO,
                    variants: Vec::new(),
                });
                products.len() - 1
            });
            let product = &mut products[product_pos];
            product.quantity += item.quantity;
            product.amount += item.line_amount;

            let variant_pos = match product
                .variants
                .iter()
                .position(|variant| variant.variant_name == item.variant_name)
            {
                Some(pos) => pos,
                None => {
                    product.variants.push(VariantSummary {
                        variant_name: item.variant_name.clone(),
                        quantity: 0,
                        amount: Decimal::ZERO,
                        sizes: Vec::new(),
                    });
                    product.variants.len() - 1
                }
            };
            let variant = &mut product.variants[variant_pos];
            variant.quantity += item.quantity;
            variant.amount += item.line_amount;

            match variant.sizes.iter_mut().find(|size| size.size == item.size) {
                Some(size) => {
                    size.quantity += item.quantity;
                    size.amount += item.line_amount;
                }
                None => variant.sizes.push(SizeSummary {
                    size: item.size.clone(),
                    quantity: item.quantity,
                    amount: item.line_amount,
                }),
            }
        }
    }

    for product in &mut products {
        for variant in &mut product.variants {
            variant.sizes.sort_by(|a, b| b.amount.cmp(&a.amount));
        }
        product.variants.sort_by(|a, b| b.amount.cmp(&a.amount));
    }
    products.sort_by(|a, b| b.amount.cmp(&a.amount));

    products
}
