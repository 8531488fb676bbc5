use serde::{Deserialize, Serialize};

use crate::script::script_model::ScriptResult;

/// Outcome of a batch of edit scripts run against fresh site loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite_name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    /// Assertions evaluated across every script
    pub assertions: usize,
    pub assertions_failed: usize,

    /// Scripts that stopped on a step error rather than a failed check
    pub errored: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub results: Vec<ScriptResult>,
}

impl SuiteReport {
    pub fn from_results(suite_name: &str, results: Vec<ScriptResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let assertions = results.iter().map(|r| r.assertion_results.len()).sum();
        let assertions_failed = results
            .iter()
            .flat_map(|r| &r.assertion_results)
            .filter(|a| !a.passed)
            .count();
        let errored = results.iter().filter(|r| r.error.is_some()).count();

        SuiteReport {
            suite_name: suite_name.to_string(),
            total: results.len(),
            passed,
            failed: results.len() - passed,
            assertions,
            assertions_failed,
            errored,
            duration_ms: None,
            results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScriptResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}
