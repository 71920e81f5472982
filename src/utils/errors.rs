use serde_json::Value;

/// Extract the user-facing message from a backend error body
///
/// The backend reports failures as `{"detail": "..."}` or, for conflicts,
/// `{"detail": {"error": "DUPLICATE_TRANSACTION", "message": "..."}}`.
/// Returns the message verbatim, or `fallback` if the body has neither shape.
pub fn extract_detail_message(body: &str, fallback: &str) -> String {
    let parsed = match serde_json::from_str::<Value>(body) {
        Ok(v) => v,
        Err(_) => return fallback.to_string(),
    };

    match parsed.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Object(obj)) => match obj.get("message").and_then(|m| m.as_str()) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => fallback.to_string(),
        },
        _ => fallback.to_string(),
    }
}

/// First `n` characters of an identifier, for compact display
pub fn short_id(id: &str, n: usize) -> String {
    id.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        let body = r#"{"detail": "Credenciales invalidas"}"#;
        assert_eq!(extract_detail_message(body, "fallback"), "Credenciales invalidas");
    }

    #[test]
    fn test_detail_object_message() {
        let body = r#"{"detail": {"error": "DUPLICATE_TRANSACTION", "message": "Ya existe una transaccion con estos datos"}}"#;
        assert_eq!(
            extract_detail_message(body, "fallback"),
            "Ya existe una transaccion con estos datos"
        );
    }

    #[test]
    fn test_fallback_when_unparseable() {
        assert_eq!(extract_detail_message("<html>502</html>", "Error al crear transaccion"), "Error al crear transaccion");
        assert_eq!(extract_detail_message(r#"{"detail": [1]}"#, "x"), "x");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("3f1c9a1e-0000", 8), "3f1c9a1e");
        assert_eq!(short_id("a1", 8), "a1");
    }
}
