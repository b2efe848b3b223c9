use thiserror::Error;

/// Failure kinds surfaced by the upload pipeline.
///
/// `Schema` means the uploaded table is missing required columns and nothing
/// was aggregated. `Processing` wraps everything validation could not
/// anticipate, such as an unreadable file or a malformed CSV row.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error(transparent)]
    Processing(#[from] anyhow::Error),
}
