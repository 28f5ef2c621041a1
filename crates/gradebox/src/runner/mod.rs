//! Batch grading for gradebox
//!
//! Drives every test case of a batch through coercion, the executor and the
//! comparator, strictly one at a time and in order, then assembles the report.

use thiserror::Error;
use tracing::{info, instrument, warn};

pub use crate::runner::case::run_case;

mod case;

use crate::{
    coerce::{ArgumentPlan, CoercionError},
    config::Config,
    harness::{ExecutionFault, Executor, HarnessError, SubprocessExecutor, prepare},
    request::{BatchRequest, Submission},
    types::{BatchReport, ResourceLimits},
};

/// Message reported for a batch without test cases
pub const EMPTY_CASES_MESSAGE: &str = "Invalid or empty test cases";

/// Request-shape problems that abort the whole batch
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{}", EMPTY_CASES_MESSAGE)]
    EmptyTestCases,

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("free-form submission requires a parameter manifest")]
    MissingManifest,

    #[error("test case {case_no} supplies {actual} inputs, expected {expected}")]
    ArityMismatch {
        case_no: u32,
        expected: usize,
        actual: usize,
    },

    #[error("submission is {len} bytes, limit is {limit}")]
    CodeTooLong { len: usize, limit: u64 },

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("invalid resource limits: {0}")]
    InvalidLimits(String),
}

/// Why a single case failed without a comparable output
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaseFault {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Execution(#[from] ExecutionFault),
}

/// Errors that make a batch report ERROR
#[derive(Debug, Error)]
pub enum GradeError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("harness failure in case {case_no}: {source}")]
    Harness {
        case_no: u32,
        #[source]
        source: HarnessError,
    },
}

/// Grades batches against one configuration
#[derive(Debug, Clone)]
pub struct Grader<E = SubprocessExecutor> {
    config: Config,
    executor: E,
}

impl Grader<SubprocessExecutor> {
    /// Create a new grader running submissions with the configured runtime
    pub fn new(config: Config) -> Self {
        let executor = SubprocessExecutor::new(config.runtime.clone());
        Self { config, executor }
    }

    /// Create a new grader with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }
}

impl<E: Executor> Grader<E> {
    /// Create a grader with a custom executor
    pub fn with_executor(config: Config, executor: E) -> Self {
        Self { config, executor }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Grade a batch, reporting any batch-level failure as `STATUS: ERROR`
    pub async fn grade(&self, request: &BatchRequest) -> BatchReport {
        match self.try_grade(request).await {
            Ok(report) => report,
            Err(err) => self.error_report(err),
        }
    }

    /// Parse a JSON batch request and grade it
    pub async fn grade_json(&self, request: &str) -> BatchReport {
        match serde_json::from_str::<BatchRequest>(request) {
            Ok(request) => self.grade(&request).await,
            Err(err) => self.error_report(SetupError::from(err).into()),
        }
    }

    /// Grade a batch
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::Setup`] if the request is unusable as a whole, or
    /// [`GradeError::Harness`] if the harness itself fails during a case. No
    /// partial results are returned in either case.
    #[instrument(skip_all, fields(cases = request.test_cases.len()))]
    pub async fn try_grade(&self, request: &BatchRequest) -> Result<BatchReport, GradeError> {
        let limits = self.config.effective_limits(request.limits.as_ref());
        let plan = self.plan(request, &limits)?;
        let program = prepare(&request.submission, &self.config.entry_point)?;

        let mut results = Vec::with_capacity(request.test_cases.len());
        for (case_no, case) in (1u32..).zip(&request.test_cases) {
            let record = run_case(&self.executor, &program, &plan, case_no, case, &limits)
                .await
                .map_err(|source| GradeError::Harness { case_no, source })?;
            results.push(record);
        }

        let report = BatchReport::from_records(results)
            .ok_or(SetupError::EmptyTestCases)?
            .with_driver(self.executor.runtime_name());

        info!(
            status = %report.status,
            failed_case_no = report.failed_case_no,
            avg_time = report.avg_time,
            avg_memory = report.avg_memory,
            "batch graded"
        );

        Ok(report)
    }

    /// Check the request's shape and decide how inputs are coerced
    fn plan(&self, request: &BatchRequest, limits: &ResourceLimits) -> Result<ArgumentPlan, SetupError> {
        if request.test_cases.is_empty() {
            return Err(SetupError::EmptyTestCases);
        }

        limits.require_deadline().map_err(SetupError::InvalidLimits)?;

        let len = request.submission.source_len();
        if let Some(limit) = limits.max_code_length
            && len as u64 > limit
        {
            return Err(SetupError::CodeTooLong { len, limit });
        }

        let plan = match &request.submission {
            Submission::FreeForm { .. } => request
                .manifest
                .as_ref()
                .map(ArgumentPlan::from_manifest)
                .ok_or(SetupError::MissingManifest)?,
            Submission::NamedFunction { args, .. } => ArgumentPlan::Declared(args.clone()),
        };

        for (case_no, case) in (1u32..).zip(&request.test_cases) {
            if case.input.len() != plan.arity() {
                return Err(SetupError::ArityMismatch {
                    case_no,
                    expected: plan.arity(),
                    actual: case.input.len(),
                });
            }
        }

        Ok(plan)
    }

    fn error_report(&self, err: GradeError) -> BatchReport {
        warn!(error = %err, "batch not graded");
        BatchReport::error(err.to_string()).with_driver(self.executor.runtime_name())
    }
}
