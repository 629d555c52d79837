//! Pass/fail result aggregation
//!
//! Results are append-only, write-once records: a `TestResult` is terminal
//! once produced, groups aggregate results, and the suite aggregates groups.
//! Derived status is the AND over all members at each level.

use std::fmt;

use colored::Colorize;

/// Verdict of a single named check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Successful,
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Successful => write!(f, "Successful"),
            TestStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// One named check with its verdict and, on failure, the original error text
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub reason: Option<String>,
}

impl TestResult {
    pub fn successful(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Successful,
            reason: None,
        }
    }

    pub fn failed(name: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Failed,
            reason: Some(reason.to_string()),
        }
    }

    /// Failure without a captured error (the check itself is the reason)
    pub fn failed_check(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Failed,
            reason: None,
        }
    }
}

/// Results of one runner execution
#[derive(Debug, Clone)]
pub struct TestGroupResult {
    pub name: String,
    pub test_results: Vec<TestResult>,
}

impl TestGroupResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test_results: Vec::new(),
        }
    }

    /// Successful iff every member result is successful
    pub fn get_status(&self) -> TestStatus {
        if self
            .test_results
            .iter()
            .all(|r| r.status == TestStatus::Successful)
        {
            TestStatus::Successful
        } else {
            TestStatus::Failed
        }
    }
}

/// Ordered results of an entire suite run
#[derive(Debug, Clone, Default)]
pub struct TestSuiteResult {
    pub test_group_results: Vec<TestGroupResult>,
}

impl TestSuiteResult {
    /// Successful iff every group is successful
    pub fn get_status(&self) -> TestStatus {
        if self
            .test_group_results
            .iter()
            .all(|g| g.get_status() == TestStatus::Successful)
        {
            TestStatus::Successful
        } else {
            TestStatus::Failed
        }
    }

    /// Render the full result tree for CI logs
    pub fn print(&self) {
        println!("\n{}", "Test Suite Results:".blue().bold());
        for group in &self.test_group_results {
            let mark = match group.get_status() {
                TestStatus::Successful => "✓".green(),
                TestStatus::Failed => "✗".red(),
            };
            println!("{} {}", mark, group.name.white().bold());
            for result in &group.test_results {
                let mark = match result.status {
                    TestStatus::Successful => "✓".green(),
                    TestStatus::Failed => "✗".red(),
                };
                match &result.reason {
                    Some(reason) => {
                        println!("  {} {} ({})", mark, result.name, reason.dimmed())
                    }
                    None => println!("  {} {}", mark, result.name),
                }
            }
        }
        println!(
            "\nOverall: {}",
            match self.get_status() {
                TestStatus::Successful => "Successful".green().bold(),
                TestStatus::Failed => "Failed".red().bold(),
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_status_is_and_over_members() {
        let mut group = TestGroupResult::new("cpu");
        group.test_results.push(TestResult::successful("cpu_usage_idle"));
        assert_eq!(group.get_status(), TestStatus::Successful);

        group
            .test_results
            .push(TestResult::failed("cpu_usage_user", "no data"));
        assert_eq!(group.get_status(), TestStatus::Failed);
    }

    #[test]
    fn empty_group_is_successful() {
        // A runner that declares no checks has nothing to fail
        let group = TestGroupResult::new("noop");
        assert_eq!(group.get_status(), TestStatus::Successful);
    }

    #[test]
    fn suite_status_folds_groups() {
        let mut suite = TestSuiteResult::default();
        let mut passing = TestGroupResult::new("a");
        passing.test_results.push(TestResult::successful("x"));
        suite.test_group_results.push(passing);
        assert_eq!(suite.get_status(), TestStatus::Successful);

        let mut failing = TestGroupResult::new("b");
        failing.test_results.push(TestResult::failed_check("y"));
        suite.test_group_results.push(failing);
        assert_eq!(suite.get_status(), TestStatus::Failed);
    }
}
