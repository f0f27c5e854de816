//! Built-in sample operations.
//!
//! Fourteen host-independent demonstration capabilities. They are always
//! registered, whatever the host has installed, and each one reads its named
//! parameters with a documented default instead of failing when a parameter
//! is missing.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use registry::{Endpoint, EndpointKind};
use serde_json::{Map, Value, json};

use crate::{ExecError, ExecutionResult, Parameters};

const TEXT: &str = "Text Processing";
const MATH: &str = "Math Operations";
const DATA: &str = "Data Processing";
const UTIL: &str = "Utilities";

/// One sample operation, addressed by its exact endpoint id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleOp {
    TextUppercase,
    TextLowercase,
    TextReverse,
    TextWordCount,
    MathAdd,
    MathMultiply,
    MathPower,
    JsonParse,
    JsonStringify,
    Delay,
    Timestamp,
    Random,
    StringConcat,
    StringReplace,
}

impl SampleOp {
    /// Catalog order.
    pub const ALL: [SampleOp; 14] = [
        SampleOp::TextUppercase,
        SampleOp::TextLowercase,
        SampleOp::TextReverse,
        SampleOp::TextWordCount,
        SampleOp::MathAdd,
        SampleOp::MathMultiply,
        SampleOp::MathPower,
        SampleOp::JsonParse,
        SampleOp::JsonStringify,
        SampleOp::Delay,
        SampleOp::Timestamp,
        SampleOp::Random,
        SampleOp::StringConcat,
        SampleOp::StringReplace,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            SampleOp::TextUppercase => "sample_text_uppercase",
            SampleOp::TextLowercase => "sample_text_lowercase",
            SampleOp::TextReverse => "sample_text_reverse",
            SampleOp::TextWordCount => "sample_text_word_count",
            SampleOp::MathAdd => "sample_math_add",
            SampleOp::MathMultiply => "sample_math_multiply",
            SampleOp::MathPower => "sample_math_power",
            SampleOp::JsonParse => "sample_data_json_parse",
            SampleOp::JsonStringify => "sample_data_json_stringify",
            SampleOp::Delay => "sample_util_delay",
            SampleOp::Timestamp => "sample_util_timestamp",
            SampleOp::Random => "sample_util_random",
            SampleOp::StringConcat => "sample_string_concat",
            SampleOp::StringReplace => "sample_string_replace",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleOp::TextUppercase => "Text to Uppercase",
            SampleOp::TextLowercase => "Text to Lowercase",
            SampleOp::TextReverse => "Reverse Text",
            SampleOp::TextWordCount => "Count Words",
            SampleOp::MathAdd => "Add Numbers",
            SampleOp::MathMultiply => "Multiply Numbers",
            SampleOp::MathPower => "Power",
            SampleOp::JsonParse => "Parse JSON",
            SampleOp::JsonStringify => "Stringify JSON",
            SampleOp::Delay => "Delay",
            SampleOp::Timestamp => "Get Timestamp",
            SampleOp::Random => "Random Number",
            SampleOp::StringConcat => "Concatenate Strings",
            SampleOp::StringReplace => "Replace Text",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SampleOp::TextUppercase => "Converts text to uppercase",
            SampleOp::TextLowercase => "Converts text to lowercase",
            SampleOp::TextReverse => "Reverses the order of characters in text",
            SampleOp::TextWordCount => "Counts the number of words in text",
            SampleOp::MathAdd => "Adds two numbers together",
            SampleOp::MathMultiply => "Multiplies two numbers together",
            SampleOp::MathPower => "Raises a number to a power",
            SampleOp::JsonParse => "Parses a JSON string into an object",
            SampleOp::JsonStringify => "Converts an object to a JSON string",
            SampleOp::Delay => "Waits for a specified number of seconds",
            SampleOp::Timestamp => "Gets the current timestamp",
            SampleOp::Random => "Generates a random number between min and max",
            SampleOp::StringConcat => "Combines two strings together",
            SampleOp::StringReplace => "Replaces occurrences of text in a string",
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            SampleOp::TextUppercase
            | SampleOp::TextLowercase
            | SampleOp::TextReverse
            | SampleOp::TextWordCount
            | SampleOp::StringConcat
            | SampleOp::StringReplace => TEXT,
            SampleOp::MathAdd | SampleOp::MathMultiply | SampleOp::MathPower => MATH,
            SampleOp::JsonParse | SampleOp::JsonStringify => DATA,
            SampleOp::Delay | SampleOp::Timestamp | SampleOp::Random => UTIL,
        }
    }

    /// Parameter names with the defaults used when a caller omits them.
    pub fn default_parameters(self) -> Parameters {
        match self {
            SampleOp::TextUppercase
            | SampleOp::TextLowercase
            | SampleOp::TextReverse
            | SampleOp::TextWordCount => params([("input", json!("text"))]),
            SampleOp::MathAdd => params([("a", json!(0)), ("b", json!(0))]),
            SampleOp::MathMultiply => params([("a", json!(1)), ("b", json!(1))]),
            SampleOp::MathPower => params([("base", json!(2)), ("exponent", json!(2))]),
            SampleOp::JsonParse => params([("json_string", json!("{}"))]),
            SampleOp::JsonStringify => params([("data", json!({}))]),
            SampleOp::Delay => params([("seconds", json!(1))]),
            SampleOp::Timestamp => Map::new(),
            SampleOp::Random => params([("min", json!(0)), ("max", json!(100))]),
            SampleOp::StringConcat => params([("str1", json!("")), ("str2", json!(""))]),
            SampleOp::StringReplace => params([
                ("text", json!("")),
                ("old", json!("")),
                ("new", json!("")),
            ]),
        }
    }

    /// Registry entry for this operation.
    pub fn endpoint(self, discovered_at: DateTime<Utc>) -> registry::Result<Endpoint> {
        Ok(
            Endpoint::new(self.id(), self.name(), self.description(), self.category())?
                .with_kind(EndpointKind::Sample)
                .with_parameters(self.default_parameters())
                .discovered_at(discovered_at),
        )
    }

    /// Run the operation against a caller-supplied parameter bag.
    pub async fn run(self, params: &Parameters) -> Result<ExecutionResult, ExecError> {
        let result = match self {
            SampleOp::TextUppercase => ExecutionResult::ok(
                "Text converted to uppercase",
                text(params, "input", "").to_uppercase(),
            ),
            SampleOp::TextLowercase => ExecutionResult::ok(
                "Text converted to lowercase",
                text(params, "input", "").to_lowercase(),
            ),
            SampleOp::TextReverse => ExecutionResult::ok(
                "Text reversed",
                text(params, "input", "").chars().rev().collect::<String>(),
            ),
            SampleOp::TextWordCount => ExecutionResult::ok(
                "Word count calculated",
                word_count(&text(params, "input", "")).to_string(),
            ),
            SampleOp::MathAdd => {
                let sum = number(params, "a", 0.0)? + number(params, "b", 0.0)?;
                ExecutionResult::ok("Numbers added", sum.to_string())
            }
            SampleOp::MathMultiply => {
                let product = number(params, "a", 1.0)? * number(params, "b", 1.0)?;
                ExecutionResult::ok("Numbers multiplied", product.to_string())
            }
            SampleOp::MathPower => {
                let power = number(params, "base", 2.0)?.powf(number(params, "exponent", 2.0)?);
                ExecutionResult::ok("Power calculated", power.to_string())
            }
            SampleOp::JsonParse => {
                let parsed = parse_json(params)?;
                ExecutionResult::ok("JSON parsed successfully", parsed.to_string())
            }
            SampleOp::JsonStringify => {
                let data = params.get("data").cloned().unwrap_or_else(|| json!({}));
                let rendered = serde_json::to_string_pretty(&data)
                    .map_err(|e| ExecError::Validation(format!("JSON stringify error: {e}")))?;
                ExecutionResult::ok("Data stringified to JSON", rendered)
            }
            SampleOp::Delay => {
                let seconds = number(params, "seconds", 1.0)?;
                tokio::time::sleep(delay_duration(seconds)?).await;
                ExecutionResult::ok(format!("Delayed for {seconds} seconds"), "Delay completed")
            }
            SampleOp::Timestamp => ExecutionResult::ok(
                "Timestamp retrieved",
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ),
            SampleOp::Random => {
                let value = random_between(number(params, "min", 0.0)?, number(params, "max", 100.0)?)?;
                ExecutionResult::ok("Random number generated", value.to_string())
            }
            SampleOp::StringConcat => {
                let mut joined = text(params, "str1", "");
                joined.push_str(&text(params, "str2", ""));
                ExecutionResult::ok("Strings concatenated", joined)
            }
            SampleOp::StringReplace => ExecutionResult::ok(
                "Text replaced",
                replace_all(
                    &text(params, "text", ""),
                    &text(params, "old", ""),
                    &text(params, "new", ""),
                ),
            ),
        };
        Ok(result)
    }
}

/// Endpoints for the whole catalog, sharing one discovery timestamp.
pub fn catalog(discovered_at: DateTime<Utc>) -> registry::Result<Vec<Endpoint>> {
    SampleOp::ALL
        .into_iter()
        .map(|op| op.endpoint(discovered_at))
        .collect()
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> Parameters {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// String parameter; non-string JSON values are used as their JSON text.
fn text(params: &Parameters, key: &str, default: &str) -> String {
    match params.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Numeric parameter; accepts JSON numbers and numeric strings.
fn number(params: &Parameters, key: &str, default: f64) -> Result<f64, ExecError> {
    let invalid = |got: &Value| {
        ExecError::Validation(format!("invalid parameter '{key}': expected a number, got {got}"))
    };
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value @ Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(value)),
        Some(value @ Value::String(s)) => s.trim().parse().map_err(|_| invalid(value)),
        Some(other) => Err(invalid(other)),
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn replace_all(text: &str, old: &str, new: &str) -> String {
    // str::replace with an empty pattern would insert `new` between every char
    if old.is_empty() {
        text.to_string()
    } else {
        text.replace(old, new)
    }
}

fn parse_json(params: &Parameters) -> Result<Value, ExecError> {
    let source = match params.get("json_string") {
        None | Some(Value::Null) => "{}",
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(ExecError::Validation(format!(
                "JSON parse error: json_string must be a string, got {other}"
            )));
        }
    };
    serde_json::from_str(source).map_err(|e| ExecError::Validation(format!("JSON parse error: {e}")))
}

fn delay_duration(seconds: f64) -> Result<Duration, ExecError> {
    // max() also maps NaN to zero
    Duration::try_from_secs_f64(seconds.max(0.0))
        .map_err(|e| ExecError::Validation(format!("invalid delay of {seconds} seconds: {e}")))
}

fn random_between(min: f64, max: f64) -> Result<f64, ExecError> {
    if !(max - min).is_finite() {
        return Err(ExecError::Validation(format!(
            "random bounds must span a finite range, got [{min}, {max})"
        )));
    }
    if min > max {
        return Err(ExecError::Validation(format!(
            "min ({min}) must not exceed max ({max})"
        )));
    }
    if min == max {
        return Ok(min);
    }
    Ok(rand::rng().random_range(min..max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn bag(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    async fn run(op: SampleOp, value: Value) -> ExecutionResult {
        op.run(&bag(value)).await.unwrap()
    }

    fn output(result: &ExecutionResult) -> &str {
        result.output.as_deref().unwrap()
    }

    #[test]
    fn catalog_has_fourteen_unique_ids() {
        let endpoints = catalog(Utc::now()).unwrap();
        assert_eq!(endpoints.len(), 14);

        let ids: HashSet<_> = endpoints.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 14);
        assert!(endpoints.iter().all(|e| e.kind == EndpointKind::Sample));
        assert!(endpoints.iter().all(|e| e.id.starts_with("sample_")));
    }

    #[test]
    fn from_id_round_trips() {
        for op in SampleOp::ALL {
            assert_eq!(SampleOp::from_id(op.id()), Some(op));
        }
        assert_eq!(SampleOp::from_id("sample_nope"), None);
    }

    #[tokio::test]
    async fn text_operations() {
        let upper = run(SampleOp::TextUppercase, json!({"input": "abc"})).await;
        assert!(upper.success);
        assert_eq!(output(&upper), "ABC");

        let lower = run(SampleOp::TextLowercase, json!({"input": "AbC"})).await;
        assert_eq!(output(&lower), "abc");

        let reversed = run(SampleOp::TextReverse, json!({"input": "héllo"})).await;
        assert_eq!(output(&reversed), "olléh");

        let count = run(SampleOp::TextWordCount, json!({"input": "a b  c"})).await;
        assert_eq!(output(&count), "3");

        let empty = run(SampleOp::TextWordCount, json!({})).await;
        assert_eq!(output(&empty), "0");
    }

    #[tokio::test]
    async fn string_operations() {
        let concat = run(SampleOp::StringConcat, json!({"str1": "foo", "str2": 42})).await;
        assert_eq!(output(&concat), "foo42");

        let replaced = run(
            SampleOp::StringReplace,
            json!({"text": "aaa", "old": "a", "new": "b"}),
        )
        .await;
        assert_eq!(output(&replaced), "bbb");

        let unchanged = run(SampleOp::StringReplace, json!({"text": "abc", "new": "x"})).await;
        assert_eq!(output(&unchanged), "abc");
    }

    #[tokio::test]
    async fn math_operations() {
        let sum = run(SampleOp::MathAdd, json!({"a": 2, "b": 3})).await;
        assert_eq!(output(&sum).parse::<f64>().unwrap(), 5.0);

        let from_strings = run(SampleOp::MathAdd, json!({"a": "1.5", "b": " 2 "})).await;
        assert_eq!(output(&from_strings).parse::<f64>().unwrap(), 3.5);

        let product = run(SampleOp::MathMultiply, json!({"a": 4})).await;
        assert_eq!(output(&product).parse::<f64>().unwrap(), 4.0);

        let power = run(SampleOp::MathPower, json!({})).await;
        assert_eq!(output(&power).parse::<f64>().unwrap(), 4.0);
    }

    #[tokio::test]
    async fn non_numeric_parameter_is_validation_error() {
        let err = SampleOp::MathAdd
            .run(&bag(json!({"a": "two"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Validation(ref m) if m.contains("'a'")));

        let err = SampleOp::MathAdd
            .run(&bag(json!({"b": [1]})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Validation(_)));
    }

    #[tokio::test]
    async fn json_parse_echoes_value() {
        let parsed = run(SampleOp::JsonParse, json!({"json_string": "{\"a\":1}"})).await;
        assert!(parsed.success);
        assert_eq!(output(&parsed), r#"{"a":1}"#);

        let default = run(SampleOp::JsonParse, json!({})).await;
        assert_eq!(output(&default), "{}");
    }

    #[tokio::test]
    async fn json_parse_reports_parse_error() {
        let err = SampleOp::JsonParse
            .run(&bag(json!({"json_string": "{bad"})))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("JSON parse error:"));
    }

    #[tokio::test]
    async fn json_stringify_indents() {
        let result = run(SampleOp::JsonStringify, json!({"data": {"a": [1, 2]}})).await;
        assert_eq!(output(&result), "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }

    #[tokio::test]
    async fn delay_completes() {
        let result = run(SampleOp::Delay, json!({"seconds": 0.01})).await;
        assert!(result.success);
        assert_eq!(output(&result), "Delay completed");

        let negative = run(SampleOp::Delay, json!({"seconds": -3})).await;
        assert!(negative.success);
    }

    #[tokio::test]
    async fn delay_rejects_unrepresentable_duration() {
        let err = SampleOp::Delay
            .run(&bag(json!({"seconds": "inf"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Validation(_)));
    }

    #[tokio::test]
    async fn timestamp_is_rfc3339_utc() {
        let result = run(SampleOp::Timestamp, json!({})).await;
        let stamp = output(&result);
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn random_stays_in_half_open_range() {
        for _ in 0..1000 {
            let value = random_between(0.0, 1.0).unwrap();
            assert!((0.0..1.0).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn random_bounds_edge_cases() {
        assert_eq!(random_between(3.0, 3.0).unwrap(), 3.0);
        assert!(random_between(5.0, 1.0).is_err());
        assert!(random_between(0.0, f64::INFINITY).is_err());
    }
}
