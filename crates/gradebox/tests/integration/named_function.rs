use gradebox::{BatchRequest, BatchStatus, FunctionArg, TestCase};

use super::test_grader;

#[tokio::test]
async fn untyped_arguments_keep_their_json_types() {
    let grader = test_grader();
    let request = BatchRequest::named_function(
        "addTwo",
        vec![FunctionArg::new("a"), FunctionArg::new("b")],
        "return a + b",
        vec![
            TestCase::new(["1", "2"], "3"),
            TestCase::new(["[1]", "[2, 3]"], "[1,2,3]"),
            TestCase::new(["foo", "bar"], "foobar"),
        ],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Passed, "{report:#?}");
    assert_eq!(report.results[2].output.as_deref(), Some(r#""foobar""#));
}

#[tokio::test]
async fn typed_arguments_are_coerced() {
    let grader = test_grader();
    let request = BatchRequest::named_function(
        "half",
        vec![FunctionArg::typed("n", "number")],
        "return n / 2",
        vec![TestCase::new(["9"], "4.5"), TestCase::new(["4"], "2")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Passed, "{report:#?}");
}

#[tokio::test]
async fn multiline_body_is_reindented() {
    let grader = test_grader();
    let body = "    total = 0\n    for x in xs:\n        total += x\n    return total\n";
    let request = BatchRequest::named_function(
        "total",
        vec![FunctionArg::new("xs")],
        body,
        vec![TestCase::new(["[1, 2, 3]"], "6")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Passed, "{report:#?}");
}

#[tokio::test]
async fn injected_signature_is_rejected() {
    let grader = test_grader();
    let request = BatchRequest::named_function(
        "f",
        vec![FunctionArg::new("a=__import__('os').getcwd()")],
        "return a",
        vec![TestCase::new(["1"], "1")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Error);
    assert!(report.results.is_empty());
}
