use serde_json::{Map, Value};

/// Accumulated key/value data a user has provided across all steps of one
/// wizard run. String keys are the canonical form.
pub type SubmissionData = Map<String, Value>;

/// Merges an update payload over the current submission. Payload values win
/// on key collision; the base is never mutated.
pub fn merge_submission(base: Option<&SubmissionData>, payload: &SubmissionData) -> SubmissionData {
    let mut merged = base.cloned().unwrap_or_default();
    for (key, value) in payload {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Canonical boolean coercion for checkbox values. Unrecognized input maps
/// to `false`.
pub fn normalize_boolean(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(num)) => num.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Some(Value::String(text)) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "t" | "1" | "on" | "y" | "yes"
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_prefers_payload_values() {
        let mut base = SubmissionData::new();
        base.insert("tier".into(), json!("silver"));
        base.insert("name".into(), json!("Ada"));
        let mut payload = SubmissionData::new();
        payload.insert("tier".into(), json!("gold"));

        let merged = merge_submission(Some(&base), &payload);
        assert_eq!(merged["tier"], json!("gold"));
        assert_eq!(merged["name"], json!("Ada"));
    }

    #[test]
    fn merge_with_no_base_copies_payload() {
        let mut payload = SubmissionData::new();
        payload.insert("tier".into(), json!("gold"));
        let merged = merge_submission(None, &payload);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn boolean_coercion_accepts_truthy_forms() {
        for value in [json!("true"), json!("1"), json!(true), json!(1), json!("YES")] {
            assert!(normalize_boolean(Some(&value)), "expected true for {value}");
        }
    }

    #[test]
    fn boolean_coercion_defaults_false() {
        for value in [json!("false"), json!("0"), json!(false), json!("maybe"), json!(null)] {
            assert!(!normalize_boolean(Some(&value)), "expected false for {value}");
        }
        assert!(!normalize_boolean(None));
    }
}
