//! One test case: coerce, invoke, judge
//!
//! Anything attributable to the case's own data or the submission's behaviour
//! on it ends up in the record. Only failures of the harness itself escape.

use tracing::{debug, instrument, warn};

use crate::coerce::ArgumentPlan;
use crate::compare::compare;
use crate::harness::{ExecutionFault, Executor, HarnessError, Invocation, Program};
use crate::request::TestCase;
use crate::runner::CaseFault;
use crate::types::{CaseRecord, ResourceLimits};

/// Run one test case and build its record
#[instrument(skip(executor, program, plan, case, limits))]
pub async fn run_case<E: Executor>(
    executor: &E,
    program: &Program,
    plan: &ArgumentPlan,
    case_no: u32,
    case: &TestCase,
    limits: &ResourceLimits,
) -> Result<CaseRecord, HarnessError> {
    let record = CaseRecord {
        case_no,
        time: 0.0,
        memory: 0.0,
        passed: false,
        output: None,
        input: case.input.clone(),
        expected: case.output.clone(),
        error: None,
        diagnostic_output: None,
        is_sample: case.is_sample,
        identifier: case.identifier.clone(),
    };

    let args = match plan.coerce(&case.input) {
        Ok(args) => args,
        Err(err) => {
            debug!(error = %err, "input coercion failed");
            return Ok(CaseRecord {
                error: Some(CaseFault::from(err).to_string()),
                ..record
            });
        }
    };

    let Invocation {
        outcome,
        usage,
        diagnostics,
    } = executor.invoke(program, &args, limits).await?;

    let outcome = outcome.and_then(|value| match limits.memory_limit_mb() {
        Some(limit) if usage.exceeds_memory(limit) => Err(ExecutionFault::MemoryLimit {
            used: usage.memory_mb,
            limit,
        }),
        _ => Ok(value),
    });

    let record = CaseRecord {
        time: usage.time_ms,
        memory: usage.memory_mb,
        diagnostic_output: diagnostics.diagnostic_text(),
        ..record
    };

    match outcome {
        Ok(value) => {
            let comparison = compare(&value, &case.output);
            debug!(passed = comparison.passed, output = %comparison.output, "case judged");
            Ok(CaseRecord {
                passed: comparison.passed,
                output: Some(comparison.output),
                ..record
            })
        }
        Err(fault) => {
            if matches!(fault, ExecutionFault::Timeout { .. }) {
                warn!(error = %fault, "case timed out");
            } else {
                debug!(error = %fault, "case faulted");
            }
            Ok(CaseRecord {
                error: Some(CaseFault::from(fault).to_string()),
                ..record
            })
        }
    }
}
