use std::io::Read;

use anyhow::Context;
use tracing::info;

use crate::error::DashboardError;
use crate::models::CustomerRecord;

/// Columns every upload must carry, by exact header name.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Churn",
    "Contract",
    "InternetService",
    "PaymentMethod",
    "TotalCharges",
];

/// Parse an uploaded CSV into normalized customer records.
///
/// The header is checked against [`REQUIRED_COLUMNS`] before any row is
/// read; a miss halts the pipeline with the full list of absent columns.
/// Extra columns are ignored, and categorical values pass through
/// unvalidated so unexpected strings simply form their own groups later.
pub fn load_table<R: Read>(input: R) -> Result<Vec<CustomerRecord>, DashboardError> {
    #[derive(serde::Deserialize)]
    struct RawRow {
        #[serde(rename = "Churn")]
        churn: String,
        #[serde(rename = "Contract")]
        contract: String,
        #[serde(rename = "InternetService")]
        internet_service: String,
        #[serde(rename = "PaymentMethod")]
        payment_method: String,
        #[serde(rename = "TotalCharges")]
        total_charges: String,
    }

    let mut reader = csv::Reader::from_reader(input);
    let headers = reader
        .headers()
        .context("failed to read the CSV header row")?
        .clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(DashboardError::Schema { missing });
    }

    let mut records = Vec::new();
    for result in reader.deserialize::<RawRow>() {
        let row = result.context("failed to parse a CSV row")?;
        records.push(CustomerRecord {
            churn: row.churn,
            contract: row.contract,
            internet_service: row.internet_service,
            payment_method: row.payment_method,
            total_charges: parse_charges(&row.total_charges),
        });
    }

    info!("loaded {} customer rows", records.len());
    Ok(records)
}

/// Best-effort parse of a `TotalCharges` value. The source data carries
/// blanks and stray text; those coerce to zero instead of failing the upload.
pub fn parse_charges(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
