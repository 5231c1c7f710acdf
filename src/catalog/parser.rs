// Value parser - type-checked parsing of parameter strings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Any string is accepted
    Text,
    Bool,
    Char,
    Integer,
    Float,
    Double,
    /// A path; any string is accepted, existence is not checked while editing
    FilePath,
    /// One of a fixed set of names
    Enumeration(Vec<String>),
    /// Comma separated integers or inclusive ranges, e.g. `1-3,7,10-12`
    RangeSet,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Text => write!(f, "text"),
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Char => write!(f, "character"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::Double => write!(f, "double"),
            ValueType::FilePath => write!(f, "file path"),
            ValueType::Enumeration(options) => write!(f, "one of [{}]", options.join(", ")),
            ValueType::RangeSet => write!(f, "range set"),
        }
    }
}

/// Validates candidate parameter strings against a declared type
pub trait ValueParser: Send + Sync {
    /// Returns a human readable reason when `input` is not a valid `value_type`
    fn check(&self, value_type: &ValueType, input: &str) -> Result<(), String>;
}

/// Parser covering every [`ValueType`] variant
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueParser;

impl ValueParser for DefaultValueParser {
    fn check(&self, value_type: &ValueType, input: &str) -> Result<(), String> {
        match value_type {
            ValueType::Text | ValueType::FilePath => Ok(()),
            ValueType::Bool => parse_bool(input).map(|_| ()),
            ValueType::Char => {
                let mut chars = input.chars();
                match (chars.next(), chars.next()) {
                    (Some(_), None) => Ok(()),
                    _ => Err(format!("'{}' is not a single character!", input)),
                }
            }
            ValueType::Integer => input
                .trim()
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("Unable to parse '{}' as an integer!", input)),
            ValueType::Float => input
                .trim()
                .parse::<f32>()
                .map(|_| ())
                .map_err(|_| format!("Unable to parse '{}' as a floating point number!", input)),
            ValueType::Double => input
                .trim()
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| format!("Unable to parse '{}' as a floating point number!", input)),
            ValueType::Enumeration(options) => {
                if options.iter().any(|o| o == input) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not a valid input!", input))
                }
            }
            ValueType::RangeSet => parse_range_set(input).map(|_| ()),
        }
    }
}

fn parse_bool(input: &str) -> Result<bool, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("Unable to parse '{}' as a boolean!", input)),
    }
}

/// Parse a range set into inclusive `(start, end)` pairs
pub fn parse_range_set(input: &str) -> Result<Vec<(i64, i64)>, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(',')
        .map(|part| {
            let part = part.trim();
            // a leading '-' belongs to the first number, so split after it
            let split_at = part
                .char_indices()
                .skip(1)
                .find(|&(_, c)| c == '-')
                .map(|(i, _)| i);
            let (start, end) = match split_at {
                Some(i) => (&part[..i], &part[i + 1..]),
                None => (part, part),
            };
            let start = start
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not a valid range!", part))?;
            let end = end
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not a valid range!", part))?;
            if end < start {
                return Err(format!("The range '{}' ends before it starts!", part));
            }
            Ok((start, end))
        })
        .collect()
}
