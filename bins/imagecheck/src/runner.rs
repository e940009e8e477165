// Verification case runner
use crate::evaluator::evaluate_case;
use crate::executor::CommandExecutor;
use crate::report;
use imagecheck_common::types::{CaseOutcome, TestCase, Variant};
use tracing::{info, warn};

/// Run every case that applies to `variant` against one running container
///
/// Cases that do not apply are skipped before execution and do not appear in
/// the returned outcomes. A failing case never stops the remaining ones.
pub async fn run_cases(
    executor: &CommandExecutor,
    container_id: &str,
    cases: &[TestCase],
    variant: Variant,
) -> Vec<CaseOutcome> {
    let applicable: Vec<&TestCase> = cases.iter().filter(|c| c.applies_to(variant)).collect();

    info!(
        variant = %variant,
        applicable = applicable.len(),
        skipped = cases.len() - applicable.len(),
        "Running verification cases"
    );

    let mut outcomes = Vec::with_capacity(applicable.len());

    for case in applicable {
        let result = executor.run(container_id, &case.invocation).await;
        let outcome = evaluate_case(case, &result);

        report::print_status(&outcome.name, outcome.passed());
        if let Err(reason) = &outcome.result {
            warn!(
                case = %outcome.name,
                command = %outcome.command,
                reason = %reason,
                output = %outcome.output.trim(),
                "Verification case failed"
            );
        }

        outcomes.push(outcome);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeExec, FakeRuntime};
    use imagecheck_common::types::Expectation;
    use std::sync::Arc;

    fn cases() -> Vec<TestCase> {
        vec![
            TestCase::new("accepts connections", "psql -c 'SELECT 1'", Expectation::exact("1")),
            TestCase::new("version check", "psql -c 'SHOW server_version'", Expectation::NonEmpty),
            TestCase::new("vector distance", "psql -c 'SELECT distance'", Expectation::prefix("5.196"))
                .extended_only(),
        ]
    }

    fn responder(argv: &[String]) -> FakeExec {
        match argv.last().map(String::as_str) {
            Some("SELECT 1") => FakeExec::exit(0, "1\n"),
            Some("SHOW server_version") => FakeExec::exit(0, "17.2\n"),
            Some("SELECT distance") => FakeExec::exit(0, "5.196152422706632\n"),
            _ => FakeExec::exit(127, "command not found"),
        }
    }

    #[tokio::test]
    async fn test_baseline_skips_extended_cases() {
        let fake = Arc::new(FakeRuntime::new(responder));
        let executor = CommandExecutor::new(fake.clone());

        let outcomes = run_cases(&executor, "c1", &cases(), Variant::Baseline).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.passed()));
        assert!(fake
            .exec_argvs()
            .iter()
            .all(|argv| argv.last().unwrap() != "SELECT distance"));
    }

    #[tokio::test]
    async fn test_extended_runs_everything() {
        let fake = Arc::new(FakeRuntime::new(responder));
        let executor = CommandExecutor::new(fake.clone());

        let outcomes = run_cases(&executor, "c1", &cases(), Variant::Extended).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(fake.exec_argvs().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_cases() {
        let fake = Arc::new(FakeRuntime::new(|argv: &[String]| {
            if argv.last().map(String::as_str) == Some("SELECT 1") {
                FakeExec::exit(2, "FATAL: database does not exist")
            } else {
                FakeExec::exit(0, "17.2")
            }
        }));
        let executor = CommandExecutor::new(fake);

        let outcomes = run_cases(&executor, "c1", &cases(), Variant::Baseline).await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].passed());
        assert!(outcomes[1].passed());
    }
}
