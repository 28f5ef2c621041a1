use std::time::{Duration, Instant};

use gradebox::{BatchRequest, BatchStatus, Manifest, ParamType, ParameterSpec, ResourceLimits, TestCase};

use super::{fixture, test_grader};

fn single_int() -> Manifest {
    Manifest::new(vec![
        ParameterSpec::new("n", ParamType::Integer),
        ParameterSpec::new("result", ParamType::Return),
    ])
    .unwrap()
}

#[tokio::test]
async fn runaway_case_is_killed_at_deadline() {
    let grader = test_grader();
    let request = BatchRequest::free_form(
        fixture("sources/spin.py"),
        single_int(),
        vec![TestCase::new(["0"], "0"), TestCase::new(["1"], "1")],
    )
    .with_limits(ResourceLimits::unset().with_wall_time_limit(0.5));

    let started = Instant::now();
    let report = grader.grade(&request).await;

    assert!(started.elapsed().as_secs() < 10);
    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.failed_case_no, 1);

    let timed_out = &report.results[0];
    assert!(timed_out.error.as_deref().unwrap().starts_with("time limit exceeded"));
    assert!(timed_out.time >= 500.0);
    assert_eq!(timed_out.memory, 0.0);
    assert!(report.results[1].passed);
}

#[tokio::test]
async fn diagnostics_do_not_bleed_between_cases() {
    let grader = test_grader();
    let request = BatchRequest::free_form(
        fixture("sources/chatty.py"),
        single_int(),
        vec![
            TestCase::new(["3"], "6"),
            TestCase::new(["-1"], "0"),
            TestCase::new(["4"], "8"),
        ],
    );

    let report = grader.grade(&request).await;

    assert_eq!(
        report.results[0].diagnostic_output.as_deref(),
        Some("case 3 call 1\n")
    );
    assert_eq!(
        report.results[1].diagnostic_output.as_deref(),
        Some("case -1 call 1\nnegative input\n")
    );
    // A fresh process per case: module state starts over every time
    assert_eq!(
        report.results[2].diagnostic_output.as_deref(),
        Some("case 4 call 1\n")
    );
}

#[tokio::test]
async fn silent_case_has_no_diagnostics() {
    let grader = test_grader();
    let request = BatchRequest::free_form(
        fixture("sources/spin.py"),
        single_int(),
        vec![TestCase::new(["7"], "7")],
    );

    let report = grader.grade(&request).await;

    assert!(report.results[0].passed);
    assert!(report.results[0].diagnostic_output.is_none());
}

#[tokio::test]
async fn oversized_output_is_truncated() {
    let grader = test_grader();
    let request = BatchRequest::free_form(
        "def execute(n):\n    print('x' * n)\n    return n\n",
        single_int(),
        vec![TestCase::new(["100000"], "100000")],
    )
    .with_limits(ResourceLimits::unset().with_max_output(1));

    let report = grader.grade(&request).await;

    let record = &report.results[0];
    assert!(record.passed);
    let diagnostics = record.diagnostic_output.as_deref().unwrap();
    assert!(diagnostics.ends_with("[output truncated]"));
    assert!(diagnostics.len() < 2048);
}

#[tokio::test]
async fn hard_exit_is_reported_as_crash() {
    let grader = test_grader();
    let request = BatchRequest::free_form(
        "import os\n\ndef execute(n):\n    os._exit(n)\n",
        single_int(),
        vec![TestCase::new(["3"], "3"), TestCase::new(["0"], "0")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(
        report.results[0].error.as_deref(),
        Some("runtime crashed: exit code 3")
    );
    assert!(report.results[1].error.as_deref().unwrap().starts_with("runtime crashed"));
}

#[tokio::test]
async fn memory_growth_over_limit_fails_case() {
    let grader = test_grader();
    let request = BatchRequest::free_form(
        "def execute(n):\n    block = b'x' * (n * 1024 * 1024)\n    return len(block) // (1024 * 1024)\n",
        single_int(),
        vec![TestCase::new(["64"], "64"), TestCase::new(["1"], "1")],
    )
    .with_limits(ResourceLimits::unset().with_memory_limit(16 * ResourceLimits::MB));

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed, "{report:#?}");
    assert_eq!(report.failed_case_no, 1);
    assert!(report.results[0].memory > 16.0);
    assert!(
        report.results[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("memory limit exceeded")
    );
    assert!(report.results[1].passed);
}

#[tokio::test]
async fn unserializable_return_value_fails_case() {
    let grader = test_grader();
    let request = BatchRequest::free_form(
        "def execute(n):\n    return {n}\n",
        single_int(),
        vec![TestCase::new(["1"], "[1]")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed);
    let error = report.results[0].error.as_deref().unwrap();
    assert!(error.starts_with("TypeError"), "{error}");
}

#[tokio::test]
async fn deadline_ends_processes_started_by_submission() {
    let grader = test_grader();
    let scratch = tempfile::tempdir().unwrap();
    let marker = scratch.path().join("alive");
    let code = format!(
        "import subprocess\n\n\
         def execute(n):\n    \
             print('before spin', flush=True)\n    \
             subprocess.Popen(['sh', '-c', 'sleep 2; echo alive > {}'])\n    \
             while True:\n        \
                 pass\n",
        marker.display()
    );
    let request = BatchRequest::free_form(code, single_int(), vec![TestCase::new(["0"], "0")])
        .with_limits(ResourceLimits::unset().with_wall_time_limit(0.5));

    let report = grader.grade(&request).await;

    let record = &report.results[0];
    assert!(record.error.as_deref().unwrap().starts_with("time limit exceeded"));
    assert_eq!(record.diagnostic_output.as_deref(), Some("before spin\n"));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!marker.exists(), "child process outlived its case");
}
