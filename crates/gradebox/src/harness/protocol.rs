//! Driver protocol
//!
//! The host hands the driver a JSON request naming the entry point and its
//! arguments; the driver answers with a JSON report written to a separate
//! file. The submission's stdout and stderr never carry protocol data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::harness::ExecutionFault;
use crate::monitor::{ResourceSample, ResourceUsage};

/// Request written for the driver before spawning it
#[derive(Debug, Clone, Serialize)]
pub struct DriverRequest<'a> {
    pub entry_point: &'a str,
    pub args: &'a [Value],
}

impl DriverRequest<'_> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Error that occurs while parsing a driver report
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed driver report: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("driver report has status 'raised' but no error")]
    MissingError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Ok,
    Raised,
}

/// Exception raised by the entry point
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RaisedError {
    pub kind: String,

    #[serde(default)]
    pub message: String,
}

/// Report written by the driver after the call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverReport {
    pub status: ReportStatus,

    /// Returned value; absent or null both mean the entry point returned nothing
    #[serde(default)]
    pub value: Value,

    #[serde(default)]
    pub error: Option<RaisedError>,

    #[serde(default)]
    pub before: Option<ResourceSample>,

    #[serde(default)]
    pub after: Option<ResourceSample>,
}

impl DriverReport {
    /// Parse a report, checking that a raised status carries its error
    pub fn parse(content: &[u8]) -> Result<Self, ProtocolError> {
        let report: DriverReport = serde_json::from_slice(content)?;
        if report.status == ReportStatus::Raised && report.error.is_none() {
            return Err(ProtocolError::MissingError);
        }
        Ok(report)
    }

    /// Usage measured inside the child, if both samples are present
    pub fn usage(&self) -> Option<ResourceUsage> {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => Some(ResourceUsage::between(before, after)),
            _ => None,
        }
    }

    /// The returned value, or the exception the entry point raised
    pub fn into_outcome(self) -> Result<Value, ExecutionFault> {
        match (self.status, self.error) {
            (ReportStatus::Ok, _) => Ok(self.value),
            (ReportStatus::Raised, Some(error)) => Err(ExecutionFault::Raised {
                kind: error.kind,
                message: error.message,
            }),
            (ReportStatus::Raised, None) => Err(ExecutionFault::Crashed {
                message: ProtocolError::MissingError.to_string(),
            }),
        }
    }
}
