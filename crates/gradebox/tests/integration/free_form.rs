use gradebox::{BatchRequest, BatchStatus, Manifest, ParamType, ParameterSpec, TestCase};

use super::{fixture, test_grader};

fn two_sum_manifest() -> Manifest {
    Manifest::new(vec![
        ParameterSpec::array("nums", ParamType::Integer, Some(5)),
        ParameterSpec::new("target", ParamType::Integer),
        ParameterSpec::new("nums", ParamType::Return),
    ])
    .unwrap()
}

fn two_sum(cases: Vec<TestCase>) -> BatchRequest {
    BatchRequest::free_form(fixture("sources/two_sum.py"), two_sum_manifest(), cases)
}

#[tokio::test]
async fn two_sum_passes() -> anyhow::Result<()> {
    let grader = test_grader();
    let request = two_sum(vec![
        TestCase::new(["[2,7,11,15]", "9"], "[0,1]").sample(),
        TestCase::new(["[3,3]", "6"], "[0,1]"),
    ]);

    let report = grader.try_grade(&request).await?;

    assert_eq!(report.status, BatchStatus::Passed, "{report:#?}");
    assert_eq!(report.failed_case_no, -1);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].output.as_deref(), Some("[0,1]"));
    assert_eq!(report.results[1].output.as_deref(), Some("[0,1]"));
    assert!(report.results[0].is_sample);
    assert_eq!(report.driver.as_deref(), Some("Python 3"));

    for record in &report.results {
        assert!(record.time.is_finite() && record.time >= 0.0);
        assert!(record.memory.is_finite());
        assert!(record.error.is_none());
    }
    Ok(())
}

#[tokio::test]
async fn request_fixture_passes() {
    let grader = test_grader();
    let report = grader.grade_json(&fixture("requests/two_sum.json")).await;

    assert_eq!(report.status, BatchStatus::Passed, "{report:#?}");
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[1].output.as_deref(), Some("[1,2]"));
    assert_eq!(
        report.results[2].identifier.as_ref().unwrap()["$oid"],
        "66b9a75a46d47620c5c61f41"
    );
}

#[tokio::test]
async fn wrong_answer_reports_lowest_failing_case() {
    let grader = test_grader();
    let request = two_sum(vec![
        TestCase::new(["[2,7,11,15]", "9"], "[0,1]"),
        TestCase::new(["[3,2,4]", "6"], "[0,2]"),
        TestCase::new(["[1,2]", "100"], "[0,1]"),
    ]);

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.failed_case_no, 2);
    assert_eq!(report.results[1].output.as_deref(), Some("[1,2]"));
    assert_eq!(report.results[2].output.as_deref(), Some("null"));
}

#[tokio::test]
async fn malformed_input_fails_case_not_batch() {
    let grader = test_grader();
    let request = two_sum(vec![
        TestCase::new(["[2,7,11", "9"], "[0,1]"),
        TestCase::new(["[3,3]", "6"], "[0,1]"),
    ]);

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.failed_case_no, 1);
    assert!(report.results[0].error.is_some());
    assert!(report.results[0].output.is_none());
    assert!(report.results[1].passed);
}

#[tokio::test]
async fn raising_entry_point_fails_case_and_batch_continues() {
    let grader = test_grader();
    let manifest = Manifest::new(vec![ParameterSpec::new("n", ParamType::Integer)]).unwrap();
    let request = BatchRequest::free_form(
        fixture("sources/chatty.py"),
        manifest,
        vec![
            TestCase::new(["-1"], "-2"),
            TestCase::new(["3"], "6"),
        ],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.failed_case_no, 1);
    assert_eq!(
        report.results[0].error.as_deref(),
        Some("ValueError: n must be non-negative")
    );
    assert!(report.results[1].passed);
}

#[tokio::test]
async fn missing_entry_point_fails_each_case() {
    let grader = test_grader();
    let manifest = Manifest::new(vec![ParameterSpec::new("n", ParamType::Integer)]).unwrap();
    let request = BatchRequest::free_form(
        "def solve(n):\n    return n\n",
        manifest,
        vec![TestCase::new(["1"], "1")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed);
    let error = report.results[0].error.as_deref().unwrap();
    assert!(error.starts_with("NameError"), "{error}");
}

#[tokio::test]
async fn syntax_error_fails_case() {
    let grader = test_grader();
    let manifest = Manifest::new(vec![ParameterSpec::new("n", ParamType::Integer)]).unwrap();
    let request = BatchRequest::free_form(
        "def execute(n)\n    return n\n",
        manifest,
        vec![TestCase::new(["1"], "1")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Failed);
    let error = report.results[0].error.as_deref().unwrap();
    assert!(error.starts_with("SyntaxError"), "{error}");
}

#[tokio::test]
async fn empty_case_list_is_error() {
    let grader = test_grader();
    let report = grader.grade(&two_sum(Vec::new())).await;

    assert_eq!(report.status, BatchStatus::Error);
    assert!(report.results.is_empty());
    assert!(report.message.is_some());
}

#[tokio::test]
async fn identical_runs_agree() {
    let grader = test_grader();
    let request = two_sum(vec![
        TestCase::new(["[3,2,4]", "6"], "[1,2]"),
        TestCase::new(["[5,5]", "11"], "[0,1]"),
    ]);

    let first = grader.grade(&request).await;
    let second = grader.grade(&request).await;

    assert_eq!(first.status, second.status);
    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.passed, b.passed);
        assert_eq!(a.output, b.output);
        assert!(a.memory.is_finite() && b.memory.is_finite());
    }
}
