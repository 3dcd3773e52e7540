//! Milk sales totals

use chrono::NaiveDate;
use farm_types::{DateRange, PaymentMethod, Sale};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentTotal {
    pub method: PaymentMethod,
    pub count: usize,
    pub litres: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sale_count: usize,
    pub total_litres: f64,
    pub total_amount: f64,
    /// Methods in fixed order, only those with at least one sale
    pub by_method: Vec<PaymentTotal>,
}

impl SalesSummary {
    pub fn compute(sales: &[Sale], range: &DateRange) -> Self {
        let in_range: Vec<&Sale> = sales.iter().filter(|s| range.contains(s.date)).collect();

        let by_method = PaymentMethod::ALL
            .iter()
            .map(|&method| {
                let matching = in_range.iter().filter(|s| s.payment_method == method);
                matching.fold(
                    PaymentTotal { method, count: 0, litres: 0.0, amount: 0.0 },
                    |mut acc, sale| {
                        acc.count += 1;
                        acc.litres += sale.litres;
                        acc.amount += sale.amount;
                        acc
                    },
                )
            })
            .filter(|t| t.count > 0)
            .collect();

        Self {
            from: range.from(),
            to: range.to(),
            sale_count: in_range.len(),
            total_litres: in_range.iter().map(|s| s.litres).sum(),
            total_amount: in_range.iter().map(|s| s.amount).sum(),
            by_method,
        }
    }

    /// Average price per litre; zero when nothing was sold
    pub fn price_per_litre(&self) -> f64 {
        if self.total_litres <= 0.0 {
            return 0.0;
        }
        self.total_amount / self.total_litres
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(d: u32, litres: f64, amount: f64, method: PaymentMethod) -> Sale {
        Sale {
            id: format!("s{}", d),
            date: NaiveDate::from_ymd_opt(2024, 2, d).unwrap(),
            customer_name: "Kamau".to_string(),
            litres,
            amount,
            payment_method: method,
            recorded_by: None,
        }
    }

    #[test]
    fn test_summary_groups_by_method_within_range() {
        let sales = vec![
            sale(1, 10.0, 500.0, PaymentMethod::Cash),
            sale(2, 5.0, 250.0, PaymentMethod::Mpesa),
            sale(3, 4.0, 200.0, PaymentMethod::Cash),
            sale(9, 50.0, 2500.0, PaymentMethod::Bank),
        ];
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
        )
        .unwrap();

        let summary = SalesSummary::compute(&sales, &range);

        assert_eq!(summary.sale_count, 3);
        assert_eq!(summary.total_litres, 19.0);
        assert_eq!(summary.total_amount, 950.0);
        let methods: Vec<_> = summary.by_method.iter().map(|t| t.method).collect();
        assert_eq!(methods, vec![PaymentMethod::Mpesa, PaymentMethod::Cash]);
        assert_eq!(summary.by_method[1].count, 2);
        assert_eq!(summary.price_per_litre(), 50.0);
    }

    #[test]
    fn test_empty_summary() {
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let summary = SalesSummary::compute(&[], &range);
        assert_eq!(summary.sale_count, 0);
        assert!(summary.by_method.is_empty());
        assert_eq!(summary.price_per_litre(), 0.0);
    }
}
