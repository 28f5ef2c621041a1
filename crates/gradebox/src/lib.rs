//! A library for grading code submissions against typed test cases.
//!
//! Gradebox takes submitted source, a parameter manifest and an ordered list
//! of test cases, runs the submission's entry point once per case in a fresh
//! interpreter process, and reports a per-case verdict along with average
//! time, average memory and an overall batch status.
//!
//! # Features
//!
//! - **Typed inputs**: raw test inputs are coerced by the manifest's declared types.
//! - **Two conventions**: free-form programs defining an entry point, or a bare
//!   function body with declared argument names.
//! - **Isolated invocations**: one interpreter process and scratch directory per case,
//!   killed at a wall clock deadline.
//! - **Resource accounting**: elapsed time and peak memory growth per case.
//! - **Canonical comparison**: outputs are compared as normalized JSON.
//! - **TOML configuration**: runtime command, entry point and default limits.
//!
//! ```rust,ignore
//! let grader = Grader::with_defaults();
//! let report = grader.grade_json(request_json).await;
//! println!("{}", serde_json::to_string(&report)?);
//! ```

pub use capture::{CapturedOutput, OutputCapture};
pub use coerce::{ArgumentPlan, CoercionError};
pub use compare::{Comparison, canonicalize, compare};
pub use config::{Config, ConfigError, EXAMPLE_CONFIG, RuntimeConfig};
pub use harness::{
    ExecutionFault, Executor, HarnessError, Invocation, Program, SubprocessExecutor,
};
pub use manifest::{ArrayProps, Manifest, ManifestError, ParamType, ParameterSpec};
pub use monitor::{ResourceSample, ResourceUsage};
pub use request::{BatchRequest, FunctionArg, Submission, TestCase};
pub use runner::{CaseFault, GradeError, Grader, SetupError};
pub use types::{BatchReport, BatchStatus, CaseRecord, ResourceLimits};

pub mod capture;
pub mod coerce;
pub mod compare;
pub mod config;
pub mod harness;
pub mod manifest;
pub mod monitor;
pub mod request;
pub mod runner;
pub mod types;
