// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFile {
    /// Snapshot definition file this test file was written against
    #[serde(default)]
    pub snapshot: Option<String>,
    #[serde(default)]
    pub test_set: Vec<TestSet>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSet {
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub test_id: Option<String>,
    pub rule: String,
}

/// A rule ready to run, with a stable id for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCase {
    pub id: String,
    pub rule: String,
}

impl RuleCase {
    pub fn new(id: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rule: rule.into(),
        }
    }
}

impl TestFile {
    /// Flatten every test set into rule cases, in file order.
    ///
    /// Cases without a `testId` are named `<set>.<case>` (1-based).
    pub fn rule_cases(&self) -> Vec<RuleCase> {
        let mut cases = Vec::new();
        for (s, set) in self.test_set.iter().enumerate() {
            for (c, case) in set.cases.iter().enumerate() {
                let id = case
                    .test_id
                    .clone()
                    .unwrap_or_else(|| format!("{}.{}", s + 1, c + 1));
                cases.push(RuleCase::new(id, case.rule.clone()));
            }
        }
        cases
    }
}
