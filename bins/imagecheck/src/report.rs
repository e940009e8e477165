// Console report: banners, per-check status lines, summary box
use imagecheck_common::types::{RunStatus, RunSummary, Variant};

const INNER_WIDTH: usize = 66;
const LABEL_WIDTH: usize = 55;

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn boxed_line(text: &str) {
    println!("║  {:<width$}║", truncate(text, INNER_WIDTH - 2), width = INNER_WIDTH - 2);
}

fn rule(left: char, right: char) {
    println!("{}{}{}", left, "═".repeat(INNER_WIDTH), right);
}

pub fn print_header(image: &str, variant: Variant) {
    rule('╔', '╗');
    boxed_line("pgEdge Postgres Image Test Suite");
    rule('╠', '╣');
    boxed_line(&format!("Image:   {}", image));
    boxed_line(&format!("Variant: {}", variant));
    rule('╚', '╝');
    println!();
}

pub fn print_phase(number: usize, title: &str) {
    println!("{}", "═".repeat(INNER_WIDTH + 1));
    println!("  Phase {}: {}", number, title);
    println!("{}", "═".repeat(INNER_WIDTH + 1));
    println!();
}

pub fn status_line(label: &str, passed: bool) -> String {
    format!(
        "  {:<width$} {}",
        truncate(label, LABEL_WIDTH),
        if passed { "✅" } else { "❌" },
        width = LABEL_WIDTH
    )
}

pub fn print_status(label: &str, passed: bool) {
    println!("{}", status_line(label, passed));
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    rule('╔', '╗');
    boxed_line("Test Summary");
    rule('╠', '╣');
    boxed_line(&format!("Tests Executed: {}", summary.executed));
    boxed_line(&format!("Errors:         {}", summary.failed));
    let status = match summary.status() {
        RunStatus::AllPassed => "✅ ALL TESTS PASSED",
        RunStatus::SomeFailed => "❌ SOME TESTS FAILED",
    };
    boxed_line(&format!("Status:         {}", status));
    rule('╚', '╝');
}
