//! Result-file decoding: one JSON record in, one [`ResultEvent`] out.
//!
//! Records carry a `"type"` discriminator and, for anchored kinds, a position
//! either flat under `pos` or wrapped as `posOpt: { "value": { ... } }`. The
//! wrapper is normalised here so nothing downstream checks which shape arrived.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use verity_types::{Category, Location, Position, ResultEvent};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("result record is not a JSON object")]
    NotAnObject,
    #[error("result record has no string `type` discriminator")]
    MissingKind,
    #[error("malformed {kind} record: {source}")]
    Payload {
        kind: Category,
        #[source]
        source: serde_json::Error,
    },
}

/// Optional wrapper as emitted by the producer: `{"type": "Some", "value": x}`
/// or `{"type": "None"}`.
#[derive(Debug, Deserialize)]
struct WireOpt<T> {
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePos {
    uri_opt: Option<WireOpt<String>>,
    uri: Option<String>,
    begin_line: u32,
    #[serde(default)]
    begin_column: u32,
    end_line: Option<u32>,
    #[serde(default)]
    end_column: u32,
}

impl WirePos {
    /// `None` when the producer did not say which document the span is in.
    fn into_location(self) -> Option<Location> {
        let document = self.uri_opt.and_then(|opt| opt.value).or(self.uri)?;
        let position = Position::new(
            self.begin_line,
            self.begin_column,
            self.end_line.unwrap_or(self.begin_line),
            self.end_column,
        );
        Some(Location::new(document, position))
    }
}

/// Free-form payload text. Producers send strings, string lists, or
/// occasionally structured values; all of them end up as display text.
#[derive(Debug, Default)]
struct Text(String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Text(render_text(&v)))
    }
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_text)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct QueryRecord {
    #[serde(default)]
    info: Text,
    query: Text,
}

#[derive(Debug, Deserialize)]
struct StateRecord {
    claims: Text,
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    message: Text,
}

#[derive(Debug, Deserialize)]
struct ReportRecord {
    level: serde_json::Number,
    message: Text,
}

impl ReportRecord {
    /// Negative, fractional and oversized levels all read as 0 (informational).
    fn level(&self) -> i64 {
        self.level.as_i64().unwrap_or(0)
    }
}

fn decode_location(record: &Value) -> Result<Option<Location>, serde_json::Error> {
    let pos = match (record.get("pos"), record.get("posOpt")) {
        (Some(pos), _) if !pos.is_null() => Some(WirePos::deserialize(pos)?),
        (_, Some(wrapper)) => Option::<WireOpt<WirePos>>::deserialize(wrapper)?
            .and_then(|opt| opt.value),
        _ => None,
    };
    Ok(pos.and_then(WirePos::into_location))
}

/// Decode the full content of one result file.
///
/// Unknown discriminators are not an error: they decode to
/// [`ResultEvent::Unrecognized`] so newer producers keep working.
pub fn decode(bytes: &[u8]) -> Result<ResultEvent, DecodeError> {
    let record: Value = serde_json::from_slice(bytes)?;
    if !record.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    let kind = record
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingKind)?;

    let Some(category) = Category::from_wire_tag(kind) else {
        return Ok(ResultEvent::Unrecognized {
            kind: kind.to_string(),
        });
    };
    let payload = |source| DecodeError::Payload {
        kind: category,
        source,
    };

    let location = decode_location(&record).map_err(payload)?;
    let event = match category {
        Category::QueryInfo => {
            let r = QueryRecord::deserialize(&record).map_err(payload)?;
            ResultEvent::QueryInfo {
                location,
                info: r.info.0,
                query: r.query.0,
            }
        }
        Category::ProofState => {
            let r = StateRecord::deserialize(&record).map_err(payload)?;
            ResultEvent::ProofState {
                location,
                claims: r.claims.0,
            }
        }
        Category::VerificationInfo => {
            let r = MessageRecord::deserialize(&record).map_err(payload)?;
            ResultEvent::VerificationInfo {
                location,
                message: r.message.0,
            }
        }
        Category::Coverage => ResultEvent::Coverage { location },
        Category::Report => {
            let r = ReportRecord::deserialize(&record).map_err(payload)?;
            ResultEvent::Report {
                location,
                level: r.level(),
                message: r.message.0,
            }
        }
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    fn pos(line: u32) -> Value {
        serde_json::json!({
            "uriOpt": { "type": "Some", "value": "file:///work/a.sc" },
            "beginLine": line,
            "beginColumn": 3,
            "endLine": line,
            "endColumn": 9,
            "offset": 0,
            "length": 6
        })
    }

    #[test]
    fn test_decode_state_with_flat_pos() {
        let json = serde_json::json!({
            "type": "Logika.Verify.State",
            "pos": pos(10),
            "claims": "x > 0"
        });
        let (location, claims) = match decode(&bytes(&json)).unwrap() {
            ResultEvent::ProofState { location, claims } => (location, claims),
            other => panic!("expected proof state, got {other:?}"),
        };
        assert_eq!(claims, "x > 0");
        let location = location.expect("location");
        assert_eq!(location.document(), "file:///work/a.sc");
        assert_eq!(location.position(), Position::new(10, 3, 10, 9));
    }

    #[test]
    fn test_decode_report_accepts_any_numeric_level() {
        for (level, expected) in [
            (serde_json::json!(-3), -3),
            (serde_json::json!(1.5), 0),
            (serde_json::json!(u64::MAX), 0),
            (serde_json::json!(1), 1),
        ] {
            let json = serde_json::json!({
                "type": "Report",
                "level": level,
                "message": "odd level"
            });
            match decode(&bytes(&json)).unwrap() {
                ResultEvent::Report { level, .. } => assert_eq!(level, expected),
                other => panic!("expected report, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_report_rejects_non_numeric_level() {
        let json = serde_json::json!({ "type": "Report", "level": "high", "message": "x" });
        assert!(matches!(
            decode(&bytes(&json)),
            Err(DecodeError::Payload { .. })
        ));
    }

    #[test]
    fn test_decode_unwraps_pos_opt() {
        let json = serde_json::json!({
            "type": "Analysis.Coverage",
            "posOpt": { "type": "Some", "value": pos(21) }
        });
        let event = decode(&bytes(&json)).unwrap();
        assert_eq!(event.category(), Some(Category::Coverage));
        assert_eq!(event.location().unwrap().position().begin_line(), 21);
    }

    #[test]
    fn test_decode_empty_pos_opt_means_no_location() {
        let json = serde_json::json!({
            "type": "Report",
            "posOpt": { "type": "None" },
            "level": 2,
            "message": "deprecated syntax"
        });
        let event = decode(&bytes(&json)).unwrap();
        assert_eq!(
            event,
            ResultEvent::Report {
                location: None,
                level: 2,
                message: "deprecated syntax".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_null_pos_falls_back_to_pos_opt() {
        let json = serde_json::json!({
            "type": "Logika.Verify.Info",
            "pos": null,
            "posOpt": { "value": pos(4) },
            "message": "verified"
        });
        let event = decode(&bytes(&json)).unwrap();
        assert_eq!(event.location().unwrap().position().begin_line(), 4);
    }

    #[test]
    fn test_decode_pos_without_document_is_unanchored() {
        let json = serde_json::json!({
            "type": "Logika.Verify.Info",
            "pos": { "uriOpt": { "type": "None" }, "beginLine": 2, "endLine": 2 },
            "message": "verified"
        });
        let event = decode(&bytes(&json)).unwrap();
        assert!(event.location().is_none());
    }

    #[test]
    fn test_decode_flat_uri_and_missing_end_line() {
        let json = serde_json::json!({
            "type": "Analysis.Coverage",
            "pos": { "uri": "file:///b.sc", "beginLine": 7 }
        });
        let event = decode(&bytes(&json)).unwrap();
        let location = event.location().unwrap();
        assert_eq!(location.document(), "file:///b.sc");
        assert_eq!(location.position().end_line(), 7);
    }

    #[test]
    fn test_decode_query_joins_info_and_query() {
        let json = serde_json::json!({
            "type": "Logika.Verify.Smt2Query",
            "pos": pos(5),
            "info": "Result: Unsat",
            "query": ["(assert p)", "(check-sat)"]
        });
        let event = decode(&bytes(&json)).unwrap();
        assert_eq!(
            event.hover_text().as_deref(),
            Some("Result: Unsat\n(assert p)\n(check-sat)")
        );
    }

    #[test]
    fn test_decode_unknown_kind_is_unrecognized() {
        let json = serde_json::json!({ "type": "Logika.Verify.Halt", "pos": pos(1) });
        let event = decode(&bytes(&json)).unwrap();
        assert_eq!(
            event,
            ResultEvent::Unrecognized {
                kind: "Logika.Verify.Halt".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = decode(b"{\"type\": \"Report\", ").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_decode_rejects_empty_file() {
        assert!(matches!(decode(b""), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[test]
    fn test_decode_rejects_missing_discriminator() {
        let err = decode(br#"{"claims": "x"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKind));
        let err = decode(br#"{"type": 3}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKind));
    }

    #[test]
    fn test_decode_rejects_missing_required_field() {
        let json = serde_json::json!({ "type": "Report", "message": "no level" });
        let err = decode(&bytes(&json)).unwrap_err();
        match err {
            DecodeError::Payload { kind, .. } => assert_eq!(kind, Category::Report),
            other => panic!("expected payload error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_mistyped_position() {
        let json = serde_json::json!({
            "type": "Analysis.Coverage",
            "pos": { "uri": "file:///b.sc", "beginLine": "seven" }
        });
        assert!(matches!(
            decode(&bytes(&json)),
            Err(DecodeError::Payload { .. })
        ));
    }
}
