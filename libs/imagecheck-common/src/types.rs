use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Build flavor advertised by the image under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Baseline,
    Extended,
}

impl Variant {
    pub fn is_extended(&self) -> bool {
        matches!(self, Variant::Extended)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Baseline => write!(f, "baseline"),
            Variant::Extended => write!(f, "extended"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid variant '{0}', must be 'baseline' or 'extended'")]
pub struct UnknownVariant(pub String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    /// Accepts the image tag names (`minimal`, `standard`) as aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baseline" | "minimal" => Ok(Variant::Baseline),
            "extended" | "standard" => Ok(Variant::Extended),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Why a verification case did not pass
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Mismatch {
    #[error("unexpected exit code: {0}")]
    ExitCode(i64),

    #[error("unexpected output: {actual:?} (expected {expected:?})")]
    Output { expected: String, actual: String },

    #[error("unexpected output: {actual:?} (expected prefix {prefix:?})")]
    Prefix { prefix: String, actual: String },

    #[error("output does not contain {needle:?}: {actual:?}")]
    Missing { needle: String, actual: String },

    #[error("empty output")]
    EmptyOutput,

    #[error("error executing command: {0}")]
    Execution(String),
}

/// Result predicate attached to a test case
///
/// Exit code is always checked first; output checks compare the trimmed
/// combined output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Exit code 0, output ignored
    Succeeds,
    Exact(String),
    /// For floating-point results where only a bounded precision is stable
    Prefix(String),
    NonEmpty,
    Contains(String),
}

impl Expectation {
    pub fn exact(s: impl Into<String>) -> Self {
        Expectation::Exact(s.into())
    }

    pub fn prefix(s: impl Into<String>) -> Self {
        Expectation::Prefix(s.into())
    }

    pub fn contains(s: impl Into<String>) -> Self {
        Expectation::Contains(s.into())
    }

    pub fn check(&self, exit_code: i64, output: &str) -> Result<(), Mismatch> {
        if exit_code != 0 {
            return Err(Mismatch::ExitCode(exit_code));
        }

        let actual = output.trim();
        match self {
            Expectation::Succeeds => Ok(()),
            Expectation::Exact(expected) if actual == expected.as_str() => Ok(()),
            Expectation::Exact(expected) => Err(Mismatch::Output {
                expected: expected.clone(),
                actual: actual.to_string(),
            }),
            Expectation::Prefix(prefix) if actual.starts_with(prefix.as_str()) => Ok(()),
            Expectation::Prefix(prefix) => Err(Mismatch::Prefix {
                prefix: prefix.clone(),
                actual: actual.to_string(),
            }),
            Expectation::NonEmpty if !actual.is_empty() => Ok(()),
            Expectation::NonEmpty => Err(Mismatch::EmptyOutput),
            Expectation::Contains(needle) if actual.contains(needle.as_str()) => Ok(()),
            Expectation::Contains(needle) => Err(Mismatch::Missing {
                needle: needle.clone(),
                actual: actual.to_string(),
            }),
        }
    }
}

/// A single verification case
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Unique within a run
    pub name: String,
    /// Command string, tokenized before execution
    pub invocation: String,
    pub expectation: Expectation,
    /// Only runs against extended images
    pub extended_only: bool,
}

impl TestCase {
    pub fn new(name: impl Into<String>, invocation: impl Into<String>, expectation: Expectation) -> Self {
        Self {
            name: name.into(),
            invocation: invocation.into(),
            expectation,
            extended_only: false,
        }
    }

    pub fn extended_only(mut self) -> Self {
        self.extended_only = true;
        self
    }

    pub fn applies_to(&self, variant: Variant) -> bool {
        !self.extended_only || variant.is_extended()
    }
}

/// Outcome of running one command inside a container
///
/// `execution_error` is only set when the runtime API failed; a program
/// exiting non-zero is reported through `exit_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i64,
    pub output: String,
    pub execution_error: Option<String>,
}

impl ExecutionResult {
    pub fn completed(exit_code: i64, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
            execution_error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            output: String::new(),
            execution_error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.execution_error.is_none() && self.exit_code == 0
    }
}

/// Evaluated result for one test case
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub name: String,
    pub command: String,
    pub output: String,
    pub result: Result<(), Mismatch>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    AllPassed,
    SomeFailed,
}

/// Counts accumulated across all phases of one harness invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, passed: bool) {
        self.executed += 1;
        if !passed {
            self.failed += 1;
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.failed == 0 {
            RunStatus::AllPassed
        } else {
            RunStatus::SomeFailed
        }
    }

    /// Process exit status
    pub fn exit_code(&self) -> i32 {
        match self.status() {
            RunStatus::AllPassed => 0,
            RunStatus::SomeFailed => 1,
        }
    }
}
