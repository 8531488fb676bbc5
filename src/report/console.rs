use crate::report::report_model::SuiteReport;
use crate::script::script_model::ScriptResult;

/// Terminal summary of an edit-script run: one line per script, then the
/// details of every failure, then totals.
///
/// ```text
/// === Edit scripts: hero.yaml ===
///
/// ✓ Hero title size (6 steps, 2 checks)
/// ✗ Card button colors (5 steps, 1 checks)
///
/// Failures:
///   Card button colors
///     step 4 Style: color of cardbutton-0: expected "#FF0000", actual "#FFFFFF"
///
/// === Results: 1 passed, 1 failed (2 total), 1 of 3 checks failed ===
/// ```
pub fn format_console_report(report: &SuiteReport) -> String {
    let mut out = format!("=== Edit scripts: {} ===\n\n", report.suite_name);

    for result in &report.results {
        let marker = if result.passed { '\u{2713}' } else { '\u{2717}' };
        out.push_str(&format!(
            "{} {} ({} steps, {} checks)\n",
            marker,
            result.script_name,
            result.steps_run,
            result.assertion_results.len()
        ));
    }

    if !report.all_passed() {
        out.push_str("\nFailures:\n");
        for result in report.failures() {
            write_failure(&mut out, result);
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total), {} of {} checks failed",
        report.passed, report.failed, report.total, report.assertions_failed, report.assertions
    ));
    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }
    out.push_str(" ===\n");
    out
}

fn write_failure(out: &mut String, result: &ScriptResult) {
    out.push_str(&format!("  {}\n", result.script_name));
    if let Some(error) = &result.error {
        out.push_str(&format!("    error: {}\n", error));
    }
    for check in result.assertion_results.iter().filter(|a| !a.passed) {
        out.push_str(&format!(
            "    step {} {}: {}\n",
            check.step_index,
            check.assertion.name(),
            check.message.as_deref().unwrap_or("check failed")
        ));
    }
}
