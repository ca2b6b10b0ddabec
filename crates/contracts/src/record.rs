//! Emitted records - the unit handed from scheduler to sink

use serde::Serialize;

/// A resolved payload value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalValue {
    /// Numeric signal
    Number(f64),
    /// Text signal
    Text(String),
    /// Opaque JSON payload (broker literals)
    Json(serde_json::Value),
}

impl std::fmt::Display for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalValue::Number(n) => write!(f, "{n}"),
            SignalValue::Text(s) => f.write_str(s),
            SignalValue::Json(v) => write!(f, "{v}"),
        }
    }
}

/// One due emission: destination plus resolved value
///
/// Transient: created per tick, consumed by the sink, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedRecord {
    /// Queue/topic name or stored-procedure name
    pub destination: String,
    /// Instrument identifier (stored-procedure sinks)
    pub instrument: Option<String>,
    /// Signal name (stored-procedure sinks)
    pub name: Option<String>,
    /// Resolved payload
    pub value: SignalValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_value_serializes_untagged() {
        assert_eq!(
            serde_json::to_string(&SignalValue::Number(1.5)).unwrap(),
            "1.5"
        );
        assert_eq!(
            serde_json::to_string(&SignalValue::Text("up".to_string())).unwrap(),
            "\"up\""
        );
        assert_eq!(
            serde_json::to_string(&SignalValue::Json(serde_json::json!({"a": 1}))).unwrap(),
            "{\"a\":1}"
        );
    }
}
