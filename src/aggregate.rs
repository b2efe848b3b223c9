use std::collections::HashMap;

use crate::models::{CustomerRecord, GroupRate};

/// Value of the `Churn` column marking a lost customer.
pub const CHURNED: &str = "Yes";
/// Value of the `Churn` column marking a kept customer.
pub const RETAINED: &str = "No";

/// Categorical columns the dashboard groups by.
#[derive(Debug, Clone, Copy)]
pub enum Dimension {
    Contract,
    InternetService,
    PaymentMethod,
}

impl Dimension {
    fn value(self, record: &CustomerRecord) -> &str {
        match self {
            Dimension::Contract => &record.contract,
            Dimension::InternetService => &record.internet_service,
            Dimension::PaymentMethod => &record.payment_method,
        }
    }
}

/// Share of all rows marked churned, as a percentage. Zero for an empty table.
pub fn overall_churn_rate(records: &[CustomerRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let churned = records.iter().filter(|r| r.churn == CHURNED).count();
    churned as f64 / records.len() as f64 * 100.0
}

/// Sum of `TotalCharges` over churned rows.
pub fn total_revenue_lost(records: &[CustomerRecord]) -> f64 {
    records
        .iter()
        .filter(|r| r.churn == CHURNED)
        .map(|r| r.total_charges)
        .sum()
}

/// Churn rate per distinct value of the given dimension.
///
/// Groups appear in first-encounter order, and a group with no churned rows
/// is still present with a rate of zero.
pub fn churn_rate_by_dimension(records: &[CustomerRecord], dimension: Dimension) -> Vec<GroupRate> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupRate> = Vec::new();

    for record in records {
        let value = dimension.value(record);
        let slot = *slots.entry(value.to_string()).or_insert_with(|| {
            groups.push(GroupRate {
                label: value.to_string(),
                row_count: 0,
                churned: 0,
                rate: 0.0,
            });
            groups.len() - 1
        });

        groups[slot].row_count += 1;
        if record.churn == CHURNED {
            groups[slot].churned += 1;
        }
    }

    for group in groups.iter_mut() {
        group.rate = group.churned as f64 / group.row_count as f64 * 100.0;
    }
    groups
}

/// Payment methods ranked by churn rate, highest first, truncated to `n`.
/// The sort is stable so tied groups keep their encounter order.
pub fn top_payment_methods_by_churn(records: &[CustomerRecord], n: usize) -> Vec<GroupRate> {
    let mut rates = churn_rate_by_dimension(records, Dimension::PaymentMethod);
    rates.sort_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(std::cmp::Ordering::Equal));
    rates.truncate(n);
    rates
}
