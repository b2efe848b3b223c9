use serde::Serialize;

/// One row of the uploaded table after validation and charge coercion.
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub churn: String,
    pub contract: String,
    pub internet_service: String,
    pub payment_method: String,
    pub total_charges: f64,
}

/// Churn rate for one distinct value of a grouping dimension.
#[derive(Debug, Clone, Serialize)]
pub struct GroupRate {
    pub label: String,
    pub row_count: usize,
    pub churned: usize,
    pub rate: f64,
}
