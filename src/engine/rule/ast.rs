// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for rule expressions

use crate::engine::value::{quote, render};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single comparison: left op right
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

/// Something that resolves to a value
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// String, number, boolean or null
    Literal(Value),
    /// Dotted path. The first segment is a candidate snapshot id, checked
    /// at resolution time; `segments` holds the rest and may be empty
    FieldPath {
        snapshot_ref: Option<String>,
        segments: Vec<String>,
    },
    /// Built-in function call with operand arguments
    FunctionCall { name: String, args: Vec<Operand> },
    /// `[a, b, ...]`
    List(Vec<Operand>),
    /// `{'key': value, ...}`
    Map(Vec<(String, Operand)>),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// left is a member of right
    In,
    /// right is a member of left
    Contains,
}

impl Expression {
    /// Snapshot ids referenced anywhere in the expression, in order of appearance
    pub fn snapshot_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.left.collect_snapshot_refs(&mut refs);
        self.right.collect_snapshot_refs(&mut refs);
        refs
    }
}

impl Operand {
    /// Snapshot ids referenced by this operand and its arguments
    pub fn snapshot_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_snapshot_refs(&mut refs);
        refs
    }

    fn collect_snapshot_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Operand::Literal(_) => {}
            Operand::FieldPath { snapshot_ref, .. } => {
                if let Some(id) = snapshot_ref {
                    if !refs.contains(&id.as_str()) {
                        refs.push(id);
                    }
                }
            }
            Operand::FunctionCall { args, .. } | Operand::List(args) => {
                for arg in args {
                    arg.collect_snapshot_refs(refs);
                }
            }
            Operand::Map(entries) => {
                for (_, value) in entries {
                    value.collect_snapshot_refs(refs);
                }
            }
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::In => write!(f, "in"),
            CompareOp::Contains => write!(f, "contains"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Operand]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", render(value)),
            Operand::FieldPath {
                snapshot_ref,
                segments,
            } => {
                let mut parts: Vec<&str> = snapshot_ref.iter().map(String::as_str).collect();
                parts.extend(segments.iter().map(String::as_str));
                write!(f, "{}", parts.join("."))
            }
            Operand::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Operand::List(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Operand::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", quote(key), value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(snapshot_ref: Option<&str>, segments: &[&str]) -> Operand {
        Operand::FieldPath {
            snapshot_ref: snapshot_ref.map(str::to_string),
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_compare_op_display() {
        assert_eq!(format!("{}", CompareOp::Eq), "==");
        assert_eq!(format!("{}", CompareOp::NotEq), "!=");
        assert_eq!(format!("{}", CompareOp::Gt), ">");
        assert_eq!(format!("{}", CompareOp::Gte), ">=");
        assert_eq!(format!("{}", CompareOp::Lt), "<");
        assert_eq!(format!("{}", CompareOp::Lte), "<=");
        assert_eq!(format!("{}", CompareOp::In), "in");
        assert_eq!(format!("{}", CompareOp::Contains), "contains");
    }

    #[test]
    fn test_expression_display() {
        let expr = Expression {
            left: Operand::FunctionCall {
                name: "length".to_string(),
                args: vec![path(Some("S1"), &["tags"])],
            },
            op: CompareOp::Gt,
            right: Operand::Literal(json!(0)),
        };
        assert_eq!(expr.to_string(), "length(S1.tags) > 0");
    }

    #[test]
    fn test_snapshot_refs_are_deduplicated() {
        let expr = Expression {
            left: Operand::FunctionCall {
                name: "concat".to_string(),
                args: vec![path(Some("S1"), &["a"]), path(Some("S2"), &["b"])],
            },
            op: CompareOp::Contains,
            right: Operand::Map(vec![("k".to_string(), path(Some("S1"), &["c"]))]),
        };
        assert_eq!(expr.snapshot_refs(), vec!["S1", "S2"]);
    }
}
