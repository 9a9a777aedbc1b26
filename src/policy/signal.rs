//! External signals and the helpers policies use to read them.

use crate::core::{CommandError, StatusValue};

use serde_json::{Map, Value};

/// A signal pulled by a command: the raw value, or the command's failure.
pub type Signal = Result<Value, CommandError>;

/// Reason used when a signal carries nothing to decide on.
pub const NO_VALUES: &str = "No values to take a decision";

/// A proposed status and the reason for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Proposed status.
    pub status: StatusValue,
    /// Reason for the proposal.
    pub reason: String,
}

impl Verdict {
    /// Creates a verdict.
    pub fn new(status: StatusValue, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Creates an `Error` verdict.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(StatusValue::Error, reason)
    }

    /// Creates an `Unknown` verdict.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::new(StatusValue::Unknown, reason)
    }
}

/// Extracts the key/value sample from a signal.
///
/// A failed command becomes an `Error` verdict carrying the failure message.
/// `null`, `[]`, `{}` and `[{}]` become `Unknown` with [`NO_VALUES`]. A list
/// is reduced to its first element.
pub fn sample(signal: &Signal) -> Result<&Map<String, Value>, Verdict> {
    let value = signal
        .as_ref()
        .map_err(|err| Verdict::error(err.message.clone()))?;
    sample_value(value)?.ok_or_else(|| Verdict::unknown(NO_VALUES))
}

/// Like [`sample`], but reports an empty signal as `Ok(None)`.
pub fn optional_sample(signal: &Signal) -> Result<Option<&Map<String, Value>>, Verdict> {
    let value = signal
        .as_ref()
        .map_err(|err| Verdict::error(err.message.clone()))?;
    sample_value(value)
}

fn sample_value(value: &Value) -> Result<Option<&Map<String, Value>>, Verdict> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => match items.first() {
            Some(first) => sample_value(first),
            None => Ok(None),
        },
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(Verdict::error(format!("Unexpected signal format: {other}"))),
    }
}

/// Reads a numeric key, accepting numbers and numeric strings.
pub fn number(values: &Map<String, Value>, key: &str) -> Result<f64, Verdict> {
    match values.get(key) {
        None | Some(Value::Null) => Err(Verdict::error(format!("Key {key} missing"))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| Verdict::error(format!("Key {key} is not a number"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Verdict::error(format!("Key {key} is not a number"))),
        Some(_) => Err(Verdict::error(format!("Key {key} is not a number"))),
    }
}

/// Reads a key as display text.
pub fn text(values: &Map<String, Value>, key: &str) -> Result<String, Verdict> {
    match values.get(key) {
        None | Some(Value::Null) => Err(Verdict::error(format!("Key {key} missing"))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sample_shapes() {
        assert_eq!(sample(&Ok(Value::Null)).unwrap_err(), Verdict::unknown(NO_VALUES));
        assert_eq!(sample(&Ok(json!([]))).unwrap_err(), Verdict::unknown(NO_VALUES));
        assert_eq!(sample(&Ok(json!([{}]))).unwrap_err(), Verdict::unknown(NO_VALUES));
        assert_eq!(sample(&Ok(json!({}))).unwrap_err(), Verdict::unknown(NO_VALUES));

        let signal = Ok(json!([{"Done": 3}, {"Done": 4}]));
        let values = sample(&signal).unwrap();
        assert_eq!(number(values, "Done").unwrap(), 3.0);

        let failed: Signal = Err(CommandError::new("JobCommand", "database unreachable"));
        assert_eq!(
            sample(&failed).unwrap_err(),
            Verdict::error("database unreachable")
        );

        assert_eq!(sample(&Ok(json!(42))).unwrap_err().status, StatusValue::Error);
    }

    #[test]
    fn test_number_and_text() {
        let signal = Ok(json!({"Total": "100", "Free": 4.5, "Name": true}));
        let values = sample(&signal).unwrap();
        assert_eq!(number(values, "Total").unwrap(), 100.0);
        assert_eq!(number(values, "Free").unwrap(), 4.5);
        assert_eq!(number(values, "Used").unwrap_err(), Verdict::error("Key Used missing"));
        assert_eq!(
            number(values, "Name").unwrap_err(),
            Verdict::error("Key Name is not a number")
        );
        assert_eq!(text(values, "Free").unwrap(), "4.5");
    }
}
