use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Wall clock deadline per invocation in seconds
    #[serde(default)]
    pub wall_time_limit: Option<f64>,

    /// Memory limit in kilobytes, checked against the measured peak delta
    #[serde(default)]
    pub memory_limit: Option<u64>,

    /// Maximum captured diagnostic output per stream in kilobytes
    #[serde(default)]
    pub max_output: Option<u64>,

    /// Maximum submission length in bytes
    #[serde(default)]
    pub max_code_length: Option<u64>,
}

impl ResourceLimits {
    /// 1 kilobyte in bytes
    pub const KB: u64 = 1024;
    /// 1 megabyte in kilobytes
    pub const MB: u64 = 1024;

    /// Create new resource limits with the default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create resource limits with every field unset
    pub fn unset() -> Self {
        Self {
            wall_time_limit: None,
            memory_limit: None,
            max_output: None,
            max_code_length: None,
        }
    }

    /// Set the wall clock deadline in seconds
    pub fn with_wall_time_limit(mut self, seconds: f64) -> Self {
        self.wall_time_limit = Some(seconds);
        self
    }

    /// Set the memory limit in kilobytes
    pub fn with_memory_limit(mut self, kb: u64) -> Self {
        self.memory_limit = Some(kb);
        self
    }

    /// Set the maximum captured output in kilobytes
    pub fn with_max_output(mut self, kb: u64) -> Self {
        self.max_output = Some(kb);
        self
    }

    /// Set the maximum submission length in bytes
    pub fn with_max_code_length(mut self, bytes: u64) -> Self {
        self.max_code_length = Some(bytes);
        self
    }

    /// Apply overrides from another ResourceLimits, preferring values from `overrides`
    pub fn with_overrides(&self, overrides: &ResourceLimits) -> ResourceLimits {
        ResourceLimits {
            wall_time_limit: overrides.wall_time_limit.or(self.wall_time_limit),
            memory_limit: overrides.memory_limit.or(self.memory_limit),
            max_output: overrides.max_output.or(self.max_output),
            max_code_length: overrides.max_code_length.or(self.max_code_length),
        }
    }

    /// The per-invocation deadline, if one is set and representable
    pub fn deadline(&self) -> Option<Duration> {
        self.wall_time_limit
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// The per-invocation deadline, required to be set, positive and finite
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if `wall_time_limit` cannot bound
    /// an invocation.
    pub fn require_deadline(&self) -> Result<Duration, String> {
        let seconds = self
            .wall_time_limit
            .ok_or_else(|| "wall_time_limit is not set".to_string())?;
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(format!(
                "wall_time_limit must be a positive number of seconds, got {seconds}"
            ));
        }
        Duration::try_from_secs_f64(seconds)
            .map_err(|_| format!("wall_time_limit of {seconds} seconds is out of range"))
    }

    /// The memory limit in megabytes
    pub fn memory_limit_mb(&self) -> Option<f64> {
        self.memory_limit.map(|kb| kb as f64 / Self::MB as f64)
    }

    /// The capture limit per stream in bytes
    pub fn max_output_bytes(&self) -> Option<usize> {
        self.max_output
            .map(|kb| usize::try_from(kb.saturating_mul(Self::KB)).unwrap_or(usize::MAX))
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            wall_time_limit: Some(3.0),
            memory_limit: Some(524288), // 512 MB
            max_output: Some(64),
            max_code_length: Some(51200), // 50 KiB
        }
    }
}

/// Structured result of running one test case
///
/// Built once by the aggregator and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    /// 1-indexed position of the case in the batch
    pub case_no: u32,

    /// Elapsed time in milliseconds
    pub time: f64,

    /// Peak resident memory delta in megabytes (may be zero or negative)
    pub memory: f64,

    pub passed: bool,

    /// Canonical rendering of the produced value, absent on fault
    pub output: Option<String>,

    /// Raw inputs echoed from the test case
    pub input: Vec<String>,

    /// Raw expected output echoed from the test case
    pub expected: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Anything the submission wrote to stdout/stderr during the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_output: Option<String>,

    #[serde(default)]
    pub is_sample: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Value>,
}

/// Overall status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    #[serde(rename = "PASSED")]
    Passed,

    #[serde(rename = "FAILED")]
    Failed,

    /// Batch-level setup failed; no case results are reported
    #[serde(rename = "ERROR")]
    Error,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BatchStatus::Passed => "PASSED",
            BatchStatus::Failed => "FAILED",
            BatchStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Aggregate report for a whole batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    #[serde(rename = "STATUS")]
    pub status: BatchStatus,

    /// Lowest failing case number, or -1 when every case passed
    pub failed_case_no: i64,

    /// Mean elapsed time in milliseconds
    pub avg_time: f64,

    /// Mean memory delta in megabytes
    pub avg_memory: f64,

    #[serde(default)]
    pub results: Vec<CaseRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Display name of the runtime that executed the batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

impl BatchReport {
    /// Assemble a report from completed case records.
    ///
    /// Returns `None` for an empty sequence; averages over zero cases are
    /// undefined and must surface as a setup error instead.
    pub fn from_records(results: Vec<CaseRecord>) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let count = results.len() as f64;
        let avg_time = results.iter().map(|r| r.time).sum::<f64>() / count;
        let avg_memory = results.iter().map(|r| r.memory).sum::<f64>() / count;

        let failed_case_no = results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| i64::from(r.case_no))
            .min();

        let status = if failed_case_no.is_some() {
            BatchStatus::Failed
        } else {
            BatchStatus::Passed
        };

        Some(Self {
            status,
            failed_case_no: failed_case_no.unwrap_or(-1),
            avg_time,
            avg_memory,
            results,
            message: None,
            driver: None,
        })
    }

    /// A batch-level error report carrying no case results
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: BatchStatus::Error,
            failed_case_no: -1,
            avg_time: 0.0,
            avg_memory: 0.0,
            results: Vec::new(),
            message: Some(message.into()),
            driver: None,
        }
    }

    /// Attach the runtime display name
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.status == BatchStatus::Passed
    }
}
