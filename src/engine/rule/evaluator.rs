//! Comparator evaluation over resolved values
//!
//! `compare` is total: every operator has a defined answer for every pair of
//! value kinds, so it never fails.

use super::ast::CompareOp;
use crate::engine::value::{compare_values, is_member, render, values_equal};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Outcome of one rule together with the values it compared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub rule: String,
    pub verdict: bool,
    pub resolved_left: Value,
    pub operator: CompareOp,
    pub resolved_right: Value,
    pub diagnostics: String,
}

/// Compare two resolved values
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::NotEq => !values_equal(left, right),
        CompareOp::Gt => ordered(left, right, |o| o == Ordering::Greater),
        CompareOp::Gte => ordered(left, right, |o| o != Ordering::Less),
        CompareOp::Lt => ordered(left, right, |o| o == Ordering::Less),
        CompareOp::Lte => ordered(left, right, |o| o != Ordering::Greater),
        CompareOp::In => is_member(right, left),
        CompareOp::Contains => is_member(left, right),
    }
}

fn ordered<F>(left: &Value, right: &Value, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    compare_values(left, right).map(accept).unwrap_or(false)
}

impl EvaluationResult {
    /// Compare the resolved operands and record what was compared
    pub fn new(rule: &str, left: Value, op: CompareOp, right: Value) -> Self {
        let verdict = compare(&left, op, &right);
        let diagnostics = format!(
            "Actual rule: {}; LHS: {}; operator: {}; RHS: {}; verdict: {}",
            rule,
            render(&left),
            op,
            render(&right),
            verdict
        );
        Self {
            rule: rule.to_string(),
            verdict,
            resolved_left: left,
            operator: op,
            resolved_right: right,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORDERING_OPS: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::NotEq,
        CompareOp::Lt,
        CompareOp::Lte,
        CompareOp::Gt,
        CompareOp::Gte,
    ];

    #[test]
    fn test_numbers_follow_numeric_semantics() {
        let samples = [json!(-2), json!(0), json!(1.5), json!(3), json!(3.0), json!(10)];
        for a in &samples {
            for b in &samples {
                let (x, y) = (a.as_f64().unwrap(), b.as_f64().unwrap());
                let expected = [x == y, x != y, x < y, x <= y, x > y, x >= y];
                for (op, want) in ORDERING_OPS.iter().zip(expected) {
                    assert_eq!(compare(a, *op, b), want, "{} {} {}", a, op, b);
                }
            }
        }
    }

    #[test]
    fn test_strings_follow_lexicographic_semantics() {
        let samples = ["", "a", "ab", "b", "B"];
        for a in samples {
            for b in samples {
                let expected = [a == b, a != b, a < b, a <= b, a > b, a >= b];
                for (op, want) in ORDERING_OPS.iter().zip(expected) {
                    assert_eq!(compare(&json!(a), *op, &json!(b)), want);
                }
            }
        }
    }

    #[test]
    fn test_mixed_kinds_never_order() {
        let samples = [json!(null), json!(true), json!(1), json!("1"), json!([1]), json!({"a": 1})];
        for a in &samples {
            for b in &samples {
                for op in [CompareOp::Lt, CompareOp::Lte, CompareOp::Gt, CompareOp::Gte] {
                    let comparable = matches!(
                        (a, b),
                        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_))
                    );
                    if !comparable {
                        assert!(!compare(a, op, b));
                    }
                }
                assert_eq!(compare(a, CompareOp::Eq, b), !compare(a, CompareOp::NotEq, b));
            }
        }
    }

    #[test]
    fn test_membership() {
        assert!(compare(&json!("a"), CompareOp::In, &json!(["a", "b"])));
        assert!(compare(&json!("a"), CompareOp::In, &json!({"a": 1})));
        assert!(!compare(&json!("a"), CompareOp::In, &json!("abc")));
        assert!(compare(&json!([1, 2]), CompareOp::Contains, &json!(2.0)));
        assert!(!compare(&json!(null), CompareOp::Contains, &json!(null)));
    }

    #[test]
    fn test_result_diagnostics() {
        let result = EvaluationResult::new("S1.sku == 'x'", json!("y"), CompareOp::Eq, json!("x"));
        assert!(!result.verdict);
        assert_eq!(
            result.diagnostics,
            "Actual rule: S1.sku == 'x'; LHS: 'y'; operator: ==; RHS: 'x'; verdict: false"
        );
    }
}
