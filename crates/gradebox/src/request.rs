//! Batch request shapes
//!
//! These mirror the JSON envelope handed over by the hosting transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::manifest::Manifest;
use crate::types::ResourceLimits;

/// One test case: raw inputs and the raw expected output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: Vec<String>,

    pub output: String,

    #[serde(default)]
    pub is_sample: bool,

    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Value>,
}

impl TestCase {
    pub fn new<I, S>(input: I, output: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            output: output.into(),
            is_sample: false,
            identifier: None,
        }
    }

    pub fn sample(mut self) -> Self {
        self.is_sample = true;
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<Value>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// A declared argument of a named-function submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionArg {
    pub name: String,

    /// Optional type tag; untyped arguments are passed through type-preserving
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl FunctionArg {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }

    pub fn typed(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind.into()),
        }
    }
}

/// The submitted code, in one of the two invocation conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submission {
    /// Only a body and argument names; the callable signature is synthesized
    NamedFunction {
        #[serde(rename = "functionName")]
        name: String,
        #[serde(rename = "functionArgs", default)]
        args: Vec<FunctionArg>,
        #[serde(rename = "functionBody")]
        body: String,
    },

    /// A full program defining the configured entry point
    FreeForm { code: String },
}

impl Submission {
    /// Length of the submitted text in bytes
    pub fn source_len(&self) -> usize {
        match self {
            Submission::NamedFunction { body, .. } => body.len(),
            Submission::FreeForm { code } => code.len(),
        }
    }
}

/// Everything needed to grade one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(flatten)]
    pub submission: Submission,

    /// Parameter manifest; used by the free-form convention only
    #[serde(default, alias = "sclObject", alias = "sdsl", skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Manifest>,

    #[serde(default)]
    pub test_cases: Vec<TestCase>,

    /// Per-request overrides merged over the configured defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceLimits>,
}

impl BatchRequest {
    /// Build a free-form request
    pub fn free_form(code: impl Into<String>, manifest: Manifest, test_cases: Vec<TestCase>) -> Self {
        Self {
            submission: Submission::FreeForm { code: code.into() },
            manifest: Some(manifest),
            test_cases,
            limits: None,
        }
    }

    /// Build a named-function request
    pub fn named_function(
        name: impl Into<String>,
        args: Vec<FunctionArg>,
        body: impl Into<String>,
        test_cases: Vec<TestCase>,
    ) -> Self {
        Self {
            submission: Submission::NamedFunction {
                name: name.into(),
                args,
                body: body.into(),
            },
            manifest: None,
            test_cases,
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = Some(limits);
        self
    }
}
