//! Response bodies for the inbound hook endpoints.

use serde::{Deserialize, Serialize};

use crate::slack::DispatchReport;

/// Plain `{"res": ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub res: String,
}

/// Outcome of relaying one accepted hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "res", rename_all = "snake_case")]
pub enum RelayResponse {
    /// Deliveries were attempted; individual failures do not fail the hook
    Delivered { delivered: usize, failed: usize },
    /// Nothing was sent
    Skipped { reason: String },
}

impl From<&DispatchReport> for RelayResponse {
    fn from(report: &DispatchReport) -> Self {
        match report {
            DispatchReport::Skipped(reason) => RelayResponse::Skipped {
                reason: reason.to_string(),
            },
            DispatchReport::Dispatched(_) => RelayResponse::Delivered {
                delivered: report.delivered(),
                failed: report.failed(),
            },
        }
    }
}
