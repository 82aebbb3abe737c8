//! Folds raw financial event groups into a [`FinancialSummary`].

use contracts::usecases::u501_amazon_financial_sync::{AdjustmentTotals, FinancialSummary};

use super::types::{Currency, FinancialEventGroup};

/// Non-zero amount, or None
fn amount(currency: &Option<Currency>) -> Option<f64> {
    currency
        .as_ref()
        .and_then(|c| c.currency_amount)
        .filter(|v| *v != 0.0)
}

pub fn summarize(groups: &[FinancialEventGroup]) -> FinancialSummary {
    let mut summary = FinancialSummary {
        order_ids: extract_order_ids(groups),
        ..Default::default()
    };
    for group in groups {
        fold_shipments(group, &mut summary);
        fold_refunds(group, &mut summary);
        fold_other(group, &mut summary);
    }
    summary.adjustments.net = summary.adjustments.credits - summary.adjustments.debits;
    summary
}

pub fn extract_order_ids(groups: &[FinancialEventGroup]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let mut push = |id: &Option<String>| {
        if let Some(id) = id {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    };
    for group in groups {
        group.shipment_event_list.iter().for_each(|e| push(&e.amazon_order_id));
        group.refund_event_list.iter().for_each(|e| push(&e.amazon_order_id));
        group.service_fee_event_list.iter().for_each(|e| push(&e.amazon_order_id));
    }
    ids
}

fn fold_shipments(group: &FinancialEventGroup, summary: &mut FinancialSummary) {
    for event in &group.shipment_event_list {
        for fee in event.shipment_fee_list.iter().chain(&event.order_fee_list) {
            if let Some(value) = amount(&fee.fee_amount) {
                add_fee(summary, fee.fee_type.as_deref(), value);
            }
        }

        for item in &event.shipment_item_list {
            let mut sku_revenue = 0.0;
            let mut sku_fees = 0.0;

            for charge in &item.item_charge_list {
                let Some(value) = amount(&charge.charge_amount) else {
                    continue;
                };
                if charge.charge_type.as_deref() == Some("Tax") {
                    summary.tax += value;
                } else {
                    summary.revenue += value;
                }
                sku_revenue += value;
            }

            for fee in &item.item_fee_list {
                if let Some(value) = amount(&fee.fee_amount) {
                    add_fee(summary, fee.fee_type.as_deref(), value);
                    sku_fees += value.abs();
                }
            }

            if let Some(sku) = &item.seller_sku {
                let entry = summary.sku_summary.entry(sku.clone()).or_default();
                entry.units += item.quantity_shipped.unwrap_or(0);
                entry.revenue += sku_revenue;
                entry.fees += sku_fees;
            }
        }
    }
}

fn add_fee(summary: &mut FinancialSummary, fee_type: Option<&str>, value: f64) {
    summary.fees += value.abs();
    if let Some(fee_type) = fee_type {
        *summary.fee_breakdown.entry(fee_type.to_string()).or_default() += value.abs();
    }
}

fn fold_refunds(group: &FinancialEventGroup, summary: &mut FinancialSummary) {
    for event in &group.refund_event_list {
        for item in &event.shipment_item_adjustment_list {
            let refunded: f64 = item
                .item_charge_adjustment_list
                .iter()
                .filter_map(|c| amount(&c.charge_amount))
                .map(f64::abs)
                .sum();
            summary.refunds += refunded;

            if let Some(sku) = &item.seller_sku {
                let entry = summary.refunds_by_sku.entry(sku.clone()).or_default();
                entry.units += item.quantity_shipped.unwrap_or(0).abs();
                entry.refund_amount += refunded;
            }
        }
    }
}

fn fold_other(group: &FinancialEventGroup, summary: &mut FinancialSummary) {
    summary.ad_spend += group
        .product_ads_payment_event_list
        .iter()
        .filter_map(|e| amount(&e.transaction_value))
        .map(f64::abs)
        .sum::<f64>();

    summary.chargebacks += group
        .chargeback_event_list
        .iter()
        .flat_map(|e| &e.shipment_item_list)
        .flat_map(|i| &i.item_charge_list)
        .filter_map(|c| amount(&c.charge_amount))
        .map(f64::abs)
        .sum::<f64>();

    summary.coupons += group
        .coupon_payment_event_list
        .iter()
        .filter_map(|e| amount(&e.total_amount))
        .map(f64::abs)
        .sum::<f64>();

    for event in &group.adjustment_event_list {
        let values = std::iter::once(amount(&event.adjustment_amount))
            .chain(event.adjustment_item_list.iter().map(|i| amount(&i.total_amount)))
            .flatten();
        for value in values {
            apply_adjustment(&mut summary.adjustments, value);
        }
    }
}

fn apply_adjustment(totals: &mut AdjustmentTotals, value: f64) {
    if value > 0.0 {
        totals.credits += value;
    } else {
        totals.debits += value.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::amazon_sp_api::types::FinancialEventsResponse;

    fn sample_groups() -> Vec<FinancialEventGroup> {
        let json = r#"{
            "payload": {
                "FinancialEvents": {
                    "ShipmentEventList": [{
                        "AmazonOrderId": "111-0000001",
                        "ShipmentItemList": [{
                            "SellerSKU": "MNQ15",
                            "QuantityShipped": 2,
                            "ItemChargeList": [
                                {"ChargeType": "Principal", "ChargeAmount": {"CurrencyAmount": 100.0}},
                                {"ChargeType": "Tax", "ChargeAmount": {"CurrencyAmount": 8.0}},
                                {"ChargeType": "GiftWrap", "ChargeAmount": {"CurrencyAmount": 0.0}}
                            ],
                            "ItemFeeList": [
                                {"FeeType": "FBAPerUnitFulfillmentFee", "FeeAmount": {"CurrencyAmount": -6.5}},
                                {"FeeType": "Commission", "FeeAmount": {"CurrencyAmount": -15.0}}
                            ]
                        }]
                    }],
                    "RefundEventList": [{
                        "AmazonOrderId": "111-0000002",
                        "ShipmentItemAdjustmentList": [{
                            "SellerSKU": "MNQ15",
                            "QuantityShipped": -1,
                            "ItemChargeAdjustmentList": [
                                {"ChargeType": "Principal", "ChargeAmount": {"CurrencyAmount": -50.0}}
                            ]
                        }]
                    }],
                    "ServiceFeeEventList": [{"AmazonOrderId": "111-0000001"}],
                    "ProductAdsPaymentEventList": [
                        {"transactionValue": {"CurrencyAmount": -20.0}}
                    ],
                    "AdjustmentEventList": [{
                        "AdjustmentAmount": {"CurrencyAmount": 12.0},
                        "AdjustmentItemList": [{"TotalAmount": {"CurrencyAmount": -2.0}}]
                    }],
                    "CouponPaymentEventList": [{"TotalAmount": {"CurrencyAmount": -3.0}}]
                }
            }
        }"#;
        let response: FinancialEventsResponse = serde_json::from_str(json).unwrap();
        vec![response.payload.unwrap().financial_events.unwrap()]
    }

    #[test]
    fn summarizes_revenue_fees_and_refunds() {
        let summary = summarize(&sample_groups());

        assert_eq!(summary.order_ids, vec!["111-0000001", "111-0000002"]);
        assert_eq!(summary.revenue, 100.0);
        assert_eq!(summary.tax, 8.0);
        assert_eq!(summary.fees, 21.5);
        assert_eq!(summary.fee_breakdown["Commission"], 15.0);
        assert_eq!(summary.refunds, 50.0);
        assert_eq!(summary.ad_spend, 20.0);
        assert_eq!(summary.coupons, 3.0);
    }

    #[test]
    fn sku_summaries_include_tax_and_refund_units() {
        let summary = summarize(&sample_groups());

        let sku = summary.sku_summary["MNQ15"];
        assert_eq!(sku.units, 2);
        assert_eq!(sku.revenue, 108.0);
        assert_eq!(sku.fees, 21.5);

        let refund = summary.refunds_by_sku["MNQ15"];
        assert_eq!(refund.units, 1);
        assert_eq!(refund.refund_amount, 50.0);
    }

    #[test]
    fn adjustments_split_credits_and_debits() {
        let summary = summarize(&sample_groups());
        assert_eq!(summary.adjustments.credits, 12.0);
        assert_eq!(summary.adjustments.debits, 2.0);
        assert_eq!(summary.adjustments.net, 10.0);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert_eq!(summarize(&[]), FinancialSummary::default());
    }
}
