// SPDX-License-Identifier: MIT

//! Built-in collection functions
//!
//! Every function receives already-resolved arguments and returns a freshly
//! built value; inputs are never modified.

use crate::engine::error::EvaluationError;
use crate::engine::value::{as_index, is_empty, is_member, kind_name, values_equal};
use serde_json::{Map, Value};

type FnResult = Result<Value, EvaluationError>;

fn invalid(function: &str, reason: impl Into<String>) -> EvaluationError {
    EvaluationError::invalid_arguments(function, reason)
}

fn arity(function: &str, args: &[Value], expected: usize) -> Result<(), EvaluationError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(invalid(
            function,
            format!("expected {} argument(s), got {}", expected, args.len()),
        ))
    }
}

fn sequence<'a>(function: &str, value: &'a Value) -> Result<&'a Vec<Value>, EvaluationError> {
    value
        .as_array()
        .ok_or_else(|| invalid(function, format!("expected sequence, got {}", kind_name(value))))
}

fn mapping<'a>(function: &str, value: &'a Value) -> Result<&'a Map<String, Value>, EvaluationError> {
    value
        .as_object()
        .ok_or_else(|| invalid(function, format!("expected mapping, got {}", kind_name(value))))
}

fn dedupe(items: &[Value]) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.iter().any(|u| values_equal(u, item)) {
            unique.push(item.clone());
        }
    }
    unique
}

/// `element(seq, idx)`: element at `idx`, wrapping around past the end
pub fn element(args: &[Value]) -> FnResult {
    arity("element", args, 2)?;
    let items = sequence("element", &args[0])?;
    if items.is_empty() {
        return Err(invalid("element", "cannot index an empty sequence"));
    }
    let index = as_index(&args[1])
        .ok_or_else(|| invalid("element", format!("index must be an integer, got {}", args[1])))?;
    if index < 0 {
        return Err(invalid("element", format!("negative index {}", index)));
    }
    let wrapped = (index as u64 % items.len() as u64) as usize;
    Ok(items[wrapped].clone())
}

/// `length(v)`: element, key or character count; `null` for `null`
pub fn length(args: &[Value]) -> FnResult {
    arity("length", args, 1)?;
    let count = match &args[0] {
        Value::Null => return Ok(Value::Null),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        other => {
            return Err(invalid(
                "length",
                format!("cannot take length of {}", kind_name(other)),
            ))
        }
    };
    Ok(Value::from(count))
}

/// `chunklist(seq, n)`: consecutive chunks of `n`, the last may be shorter
pub fn chunklist(args: &[Value]) -> FnResult {
    arity("chunklist", args, 2)?;
    let items = sequence("chunklist", &args[0])?;
    let size = match as_index(&args[1]) {
        Some(n) if n > 0 => n as usize,
        _ => {
            return Err(invalid(
                "chunklist",
                format!("chunk size must be a positive integer, got {}", args[1]),
            ))
        }
    };
    Ok(Value::Array(
        items
            .chunks(size)
            .map(|chunk| Value::Array(chunk.to_vec()))
            .collect(),
    ))
}

/// `concat(seq...)`: sequences joined in argument order
pub fn concat(args: &[Value]) -> FnResult {
    let mut joined = Vec::new();
    for arg in args {
        joined.extend(sequence("concat", arg)?.iter().cloned());
    }
    Ok(Value::Array(joined))
}

/// `coalesce(v...)`: first argument that is not null or empty
pub fn coalesce(args: &[Value]) -> FnResult {
    Ok(args
        .iter()
        .find(|arg| !is_empty(arg))
        .cloned()
        .unwrap_or(Value::Null))
}

/// `coalescelist(seq...)`: first sequence that is not empty
pub fn coalescelist(args: &[Value]) -> FnResult {
    coalesce(args)
}

/// `compact(seq)`: drops empty-string elements, preserving order
pub fn compact(args: &[Value]) -> FnResult {
    arity("compact", args, 1)?;
    let items = sequence("compact", &args[0])?;
    Ok(Value::Array(
        items
            .iter()
            .filter(|item| item.as_str() != Some(""))
            .cloned()
            .collect(),
    ))
}

/// `distinct(seq)`: duplicates removed (first occurrence kept)
pub fn distinct(args: &[Value]) -> FnResult {
    arity("distinct", args, 1)?;
    let items = sequence("distinct", &args[0])?;
    Ok(Value::Array(dedupe(items)))
}

/// `index(seq, value)`: position of the first equal element, or -1
pub fn index(args: &[Value]) -> FnResult {
    arity("index", args, 2)?;
    let items = sequence("index", &args[0])?;
    let position = items
        .iter()
        .position(|item| values_equal(item, &args[1]))
        .map(|p| p as i64)
        .unwrap_or(-1);
    Ok(Value::from(position))
}

/// `lookup(map, key, default?)`
pub fn lookup(args: &[Value]) -> FnResult {
    if !(2..=3).contains(&args.len()) {
        return Err(invalid(
            "lookup",
            format!("expected 2 or 3 arguments, got {}", args.len()),
        ));
    }
    let map = mapping("lookup", &args[0])?;
    let key = args[1]
        .as_str()
        .ok_or_else(|| invalid("lookup", format!("key must be a string, got {}", kind_name(&args[1]))))?;
    let default = args.get(2).cloned().unwrap_or(Value::Null);
    Ok(map.get(key).cloned().unwrap_or(default))
}

/// `contains(container, value)`: element, key or substring membership
pub fn contains(args: &[Value]) -> FnResult {
    arity("contains", args, 2)?;
    let found = match (&args[0], &args[1]) {
        (Value::Array(_), candidate) | (Value::Object(_), candidate) => {
            is_member(&args[0], candidate)
        }
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (container, _) => {
            return Err(invalid(
                "contains",
                format!("cannot search in {}", kind_name(container)),
            ))
        }
    };
    Ok(Value::Bool(found))
}

/// `keys(map)`: keys in insertion order
pub fn keys(args: &[Value]) -> FnResult {
    arity("keys", args, 1)?;
    let map = mapping("keys", &args[0])?;
    Ok(Value::Array(
        map.keys().map(|k| Value::String(k.clone())).collect(),
    ))
}

/// `to_list(v...)`
pub fn to_list(args: &[Value]) -> FnResult {
    Ok(Value::Array(args.to_vec()))
}

/// `to_map(k1, v1, k2, v2, ...)`
pub fn to_map(args: &[Value]) -> FnResult {
    if args.len() % 2 != 0 {
        return Err(invalid(
            "to_map",
            format!("expected an even number of arguments, got {}", args.len()),
        ));
    }
    let mut map = Map::new();
    for pair in args.chunks(2) {
        let key = match &pair[0] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(invalid(
                    "to_map",
                    format!("{} cannot be used as a key", kind_name(other)),
                ))
            }
        };
        map.insert(key, pair[1].clone());
    }
    Ok(Value::Object(map))
}

/// `merge(map...)`: right-most value wins on key collision
pub fn merge(args: &[Value]) -> FnResult {
    let mut merged = Map::new();
    for arg in args {
        for (key, value) in mapping("merge", arg)? {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

/// `reverse(seq)`
pub fn reverse(args: &[Value]) -> FnResult {
    arity("reverse", args, 1)?;
    let items = sequence("reverse", &args[0])?;
    Ok(Value::Array(items.iter().rev().cloned().collect()))
}

/// `setintersection(seq, seq, ...)`: elements common to every sequence
pub fn setintersection(args: &[Value]) -> FnResult {
    if args.len() < 2 {
        return Err(invalid(
            "setintersection",
            format!("expected at least 2 arguments, got {}", args.len()),
        ));
    }
    let sets = args
        .iter()
        .map(|arg| sequence("setintersection", arg))
        .collect::<Result<Vec<_>, _>>()?;

    let common = dedupe(sets[0])
        .into_iter()
        .filter(|item| {
            sets[1..]
                .iter()
                .all(|set| set.iter().any(|other| values_equal(other, item)))
        })
        .collect();
    Ok(Value::Array(common))
}
