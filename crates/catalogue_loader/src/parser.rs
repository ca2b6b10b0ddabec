//! Catalogue parsing
//!
//! One JSON object per file: top-level keys are destination names, values
//! are arrays of item objects. Document order is preserved by the
//! `Catalogue` deserializer.

use contracts::{BroadcastError, Catalogue};

/// Parse JSON catalogue content
pub fn parse(content: &str) -> Result<Catalogue, BroadcastError> {
    serde_json::from_str(content).map_err(|e| BroadcastError::CatalogueParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PayloadSource;

    #[test]
    fn test_parse_broker_style() {
        let content = r#"{
            "TOPIC.status": [
                {"frequency": 2, "message": {"state": "Running"}},
                {"frequency": 0, "message": "hello"}
            ]
        }"#;

        let catalogue = parse(content).unwrap();
        assert_eq!(catalogue.len(), 1);
        let items = catalogue.get("TOPIC.status").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].frequency, 0.0);
    }

    #[test]
    fn test_parse_procedure_style() {
        let content = r#"{
            "pvUpdate": [
                {"frequency": 1, "instrument": "TEST", "name": "pv2", "function": "x * 2"}
            ]
        }"#;

        let catalogue = parse(content).unwrap();
        let item = &catalogue.get("pvUpdate").unwrap()[0];
        assert_eq!(item.name.as_deref(), Some("pv2"));
        assert!(matches!(item.payload, PayloadSource::Expression(_)));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse("[1, 2, 3]").is_err());
        assert!(parse("not json at all").is_err());
    }
}
