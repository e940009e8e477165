/// Case Evaluator
///
/// Pure function: (test case, execution result) → case outcome.
/// Knows nothing about Docker or containers.
///
/// **Rules:**
/// - An execution error fails the case, whatever the expectation
/// - Otherwise the case's `Expectation` decides, exit code first

use imagecheck_common::types::{CaseOutcome, ExecutionResult, Mismatch, TestCase};

pub fn evaluate_case(case: &TestCase, result: &ExecutionResult) -> CaseOutcome {
    let verdict = match &result.execution_error {
        Some(err) => Err(Mismatch::Execution(err.clone())),
        None => case.expectation.check(result.exit_code, &result.output),
    };

    CaseOutcome {
        name: case.name.clone(),
        command: case.invocation.clone(),
        output: result.output.clone(),
        result: verdict,
    }
}
