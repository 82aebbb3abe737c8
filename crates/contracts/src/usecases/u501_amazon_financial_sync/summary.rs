use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuRefund {
    pub units: i64,
    pub refund_amount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuSummary {
    pub units: i64,
    /// Item charges including tax
    pub revenue: f64,
    pub fees: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentTotals {
    pub credits: f64,
    pub debits: f64,
    pub net: f64,
}

/// Totals folded from Amazon financial event groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub order_ids: Vec<String>,
    pub revenue: f64,
    pub tax: f64,
    pub fees: f64,
    pub refunds: f64,
    pub ad_spend: f64,
    pub chargebacks: f64,
    pub coupons: f64,
    pub adjustments: AdjustmentTotals,
    pub fee_breakdown: BTreeMap<String, f64>,
    pub refunds_by_sku: BTreeMap<String, SkuRefund>,
    pub sku_summary: BTreeMap<String, SkuSummary>,
}

impl FinancialSummary {
    /// Adds another summary into this one; order ids stay unique.
    pub fn merge(&mut self, other: &FinancialSummary) {
        let mut seen: HashSet<String> = self.order_ids.iter().cloned().collect();
        for id in &other.order_ids {
            if seen.insert(id.clone()) {
                self.order_ids.push(id.clone());
            }
        }
        self.revenue += other.revenue;
        self.tax += other.tax;
        self.fees += other.fees;
        self.refunds += other.refunds;
        self.ad_spend += other.ad_spend;
        self.chargebacks += other.chargebacks;
        self.coupons += other.coupons;
        self.adjustments.credits += other.adjustments.credits;
        self.adjustments.debits += other.adjustments.debits;
        self.adjustments.net = self.adjustments.credits - self.adjustments.debits;
        for (fee, amount) in &other.fee_breakdown {
            *self.fee_breakdown.entry(fee.clone()).or_default() += amount;
        }
        for (sku, refund) in &other.refunds_by_sku {
            let entry = self.refunds_by_sku.entry(sku.clone()).or_default();
            entry.units += refund.units;
            entry.refund_amount += refund.refund_amount;
        }
        for (sku, summary) in &other.sku_summary {
            let entry = self.sku_summary.entry(sku.clone()).or_default();
            entry.units += summary.units;
            entry.revenue += summary.revenue;
            entry.fees += summary.fees;
        }
    }

    /// Revenue minus fees, refunds, ad spend and chargebacks, plus net adjustments
    pub fn net_proceeds(&self) -> f64 {
        self.revenue - self.fees - self.refunds - self.ad_spend - self.chargebacks
            + self.adjustments.net
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_and_dedups_orders() {
        let mut a = FinancialSummary {
            order_ids: vec!["111".into()],
            revenue: 100.0,
            fees: 15.0,
            ..Default::default()
        };
        a.fee_breakdown.insert("FBAPerUnitFulfillmentFee".into(), 5.0);

        let mut b = FinancialSummary {
            order_ids: vec!["111".into(), "222".into()],
            revenue: 50.0,
            refunds: 10.0,
            ..Default::default()
        };
        b.fee_breakdown.insert("FBAPerUnitFulfillmentFee".into(), 2.5);
        b.adjustments = AdjustmentTotals {
            credits: 4.0,
            debits: 1.0,
            net: 3.0,
        };

        a.merge(&b);
        assert_eq!(a.order_ids, vec!["111".to_string(), "222".to_string()]);
        assert_eq!(a.revenue, 150.0);
        assert_eq!(a.fee_breakdown["FBAPerUnitFulfillmentFee"], 7.5);
        assert_eq!(a.adjustments.net, 3.0);
        assert_eq!(a.net_proceeds(), 150.0 - 15.0 - 10.0 + 3.0);
    }

    #[test]
    fn merge_keeps_first_seen_order_for_many_chunks() {
        let mut total = FinancialSummary::default();
        for chunk in 0..50 {
            let part = FinancialSummary {
                order_ids: (0..200).map(|i| format!("{}", chunk * 100 + i)).collect(),
                ..Default::default()
            };
            total.merge(&part);
        }
        assert_eq!(total.order_ids.len(), 49 * 100 + 200);
        assert_eq!(total.order_ids[0], "0");
        assert_eq!(total.order_ids[200], "200");
        let unique: HashSet<&String> = total.order_ids.iter().collect();
        assert_eq!(unique.len(), total.order_ids.len());
    }
}
