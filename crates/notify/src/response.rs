use courier_core::notify::entity::SendResult;
use courier_core::notify::error::NotifyError;
use courier_core::notify::request::{HttpResponse, MatchMode, ResponseBodyType, ResponseHandlerConfig};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

// Maximum body length quoted in transport errors
const ERROR_BODY_LIMIT: usize = 512;

/// # Summary
/// Classifies a raw platform response as success or a typed error.
///
/// # Logic
/// 1. Status outside `status_range` becomes `NotifyError::Network` quoting the truncated body,
///    unless it falls in `json_error_range` and the body is JSON, which makes it a
///    `NotifyError::Platform` read from the error paths.
/// 2. With `check_body`, the body is parsed and the field at `path` is compared to `expect`
///    under `mode`. A mismatch becomes `NotifyError::Platform` carrying the platform's code
///    and message read from `code_path` and `msg_path`.
/// 3. Otherwise returns a `SendResult` with the status, the raw bytes and any metadata
///    fields named by the config.
pub fn classify(config: &ResponseHandlerConfig, response: HttpResponse) -> Result<SendResult, NotifyError> {
    if !config.status_range.contains(&response.status) {
        if let Some(body) = json_error_body(config, &response) {
            return Err(platform_error(config, Some(&body)));
        }
        return Err(NotifyError::Network(format!(
            "unexpected HTTP status {}: {}",
            response.status,
            truncate(&String::from_utf8_lossy(&response.body), ERROR_BODY_LIMIT)
        )));
    }

    let parsed = match config.body_type {
        ResponseBodyType::Json if config.check_body || !config.metadata.is_empty() => {
            Some(parse_json(config, &response.body)?)
        }
        _ => None,
    };

    if config.check_body {
        let passed = match (&config.body_type, &parsed) {
            (ResponseBodyType::Json, Some(body)) => matches(config, lookup(body, &config.path))?,
            _ => {
                let text = Value::String(String::from_utf8_lossy(&response.body).into_owned());
                matches(config, Some(&text))?
            }
        };
        if !passed {
            return Err(platform_error(config, parsed.as_ref()));
        }
    }

    let metadata: HashMap<String, String> = parsed
        .as_ref()
        .map(|body| {
            config
                .metadata
                .iter()
                .filter_map(|(key, path)| {
                    lookup(body, path)
                        .filter(|v| !v.is_null())
                        .map(|v| (key.clone(), value_text(v)))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(SendResult {
        status_code: response.status,
        raw_body: response.body,
        metadata,
    })
}

/// The parsed body of a non-success status the platform still answers in JSON.
fn json_error_body(config: &ResponseHandlerConfig, response: &HttpResponse) -> Option<Value> {
    config
        .json_error_range
        .as_ref()
        .filter(|range| range.contains(&response.status))
        .and_then(|_| serde_json::from_slice(&response.body).ok())
}

fn parse_json(config: &ResponseHandlerConfig, body: &[u8]) -> Result<Value, NotifyError> {
    serde_json::from_slice(body).map_err(|e| {
        if config.check_body {
            NotifyError::Platform {
                code: None,
                message: format!(
                    "invalid response body ({}): {}",
                    e,
                    truncate(&String::from_utf8_lossy(body), ERROR_BODY_LIMIT)
                ),
            }
        } else {
            NotifyError::Network(format!("invalid response body: {}", e))
        }
    })
}

/// Walks a dotted path; numeric segments index into arrays.
pub(crate) fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(body);
    }
    path.split('.').try_fold(body, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn matches(config: &ResponseHandlerConfig, actual: Option<&Value>) -> Result<bool, NotifyError> {
    let result = match config.mode {
        MatchMode::Equal => actual.is_some_and(|v| values_equal(v, &config.expect)),
        MatchMode::NotEqual => actual.is_some_and(|v| !values_equal(v, &config.expect)),
        MatchMode::Present => actual.is_some_and(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }),
        MatchMode::Regex => {
            let pattern = config.expect.as_str().ok_or_else(|| {
                NotifyError::Config("regex response check needs a string pattern".to_string())
            })?;
            let re = Regex::new(pattern)
                .map_err(|e| NotifyError::Config(format!("invalid response pattern {}: {}", pattern, e)))?;
            actual.is_some_and(|v| re.is_match(&value_text(v)))
        }
    };
    Ok(result)
}

fn values_equal(actual: &Value, expect: &Value) -> bool {
    match (actual, expect) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => actual == expect,
    }
}

fn platform_error(config: &ResponseHandlerConfig, body: Option<&Value>) -> NotifyError {
    let field = |path: &Option<String>| {
        body.zip(path.as_deref())
            .and_then(|(b, p)| lookup(b, p))
            .filter(|v| !v.is_null())
    };

    let code = field(&config.code_path).and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });
    let message = field(&config.msg_path)
        .map(value_text)
        .unwrap_or_else(|| {
            let actual = body
                .and_then(|b| lookup(b, &config.path))
                .map(value_text)
                .unwrap_or_else(|| "<missing>".to_string());
            format!("response check failed on {}: got {}", display_path(&config.path), actual)
        });

    NotifyError::Platform { code, message }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<body>" } else { path }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errcode_config() -> ResponseHandlerConfig {
        ResponseHandlerConfig::json_field("errcode", 0).with_error_paths("errcode", "errmsg")
    }

    #[test]
    fn test_success_keeps_raw_body() {
        let result = classify(
            &errcode_config(),
            HttpResponse::new(200, r#"{"errcode":0,"errmsg":"ok"}"#),
        )
        .unwrap();
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body_text(), r#"{"errcode":0,"errmsg":"ok"}"#);
    }

    #[test]
    fn test_api_error_carries_code_and_message() {
        let err = classify(
            &errcode_config(),
            HttpResponse::new(200, r#"{"errcode":310000,"errmsg":"sign not match"}"#),
        )
        .unwrap_err();
        match err {
            NotifyError::Platform { code, message } => {
                assert_eq!(code, Some(310000));
                assert_eq!(message, "sign not match");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_status_is_transport_error() {
        let err = classify(&errcode_config(), HttpResponse::new(502, "gateway")).unwrap_err();
        assert_eq!(err.to_string(), "Network error: unexpected HTTP status 502: gateway");

        let long = "x".repeat(2000);
        let err = classify(&ResponseHandlerConfig::status_only(), HttpResponse::new(500, long))
            .unwrap_err();
        assert!(err.to_string().ends_with("..."));
        assert!(err.to_string().len() < 600);
    }

    #[test]
    fn test_status_range_override() {
        let config = ResponseHandlerConfig::status_only().with_status_range(200..=404);
        assert!(classify(&config, HttpResponse::new(404, "")).is_ok());
    }

    #[test]
    fn test_json_error_range_needs_a_json_body() {
        let config = ResponseHandlerConfig::json_field("ok", true)
            .with_error_paths("error_code", "description")
            .with_json_error_range(400..=499);

        let err = classify(
            &config,
            HttpResponse::new(403, r#"{"ok":false,"error_code":403,"description":"Forbidden"}"#),
        )
        .unwrap_err();
        match err {
            NotifyError::Platform { code, message } => {
                assert_eq!(code, Some(403));
                assert_eq!(message, "Forbidden");
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = classify(&config, HttpResponse::new(404, "<html>Not Found</html>")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Network error: unexpected HTTP status 404: <html>Not Found</html>"
        );

        let err = classify(&config, HttpResponse::new(400, r#"{"ok":true}"#)).unwrap_err();
        assert!(matches!(err, NotifyError::Platform { .. }));

        let err = classify(&config, HttpResponse::new(502, r#"{"ok":false}"#)).unwrap_err();
        assert!(matches!(err, NotifyError::Network(_)));
    }

    #[test]
    fn test_unparseable_body_is_api_error() {
        let err = classify(&errcode_config(), HttpResponse::new(200, "<html>")).unwrap_err();
        assert!(matches!(err, NotifyError::Platform { code: None, .. }));
    }

    #[test]
    fn test_match_modes() {
        let body = |v: Value| HttpResponse::new(200, v.to_string());

        let ok_true = ResponseHandlerConfig::json_field("ok", true);
        assert!(classify(&ok_true, body(json!({"ok": true}))).is_ok());
        assert!(classify(&ok_true, body(json!({"ok": false}))).is_err());
        assert!(classify(&ok_true, body(json!({}))).is_err());

        let not_error = ResponseHandlerConfig::json_field("status", "error").with_mode(MatchMode::NotEqual);
        assert!(classify(&not_error, body(json!({"status": "sent"}))).is_ok());
        assert!(classify(&not_error, body(json!({"status": "error"}))).is_err());
        assert!(classify(&not_error, body(json!({}))).is_err());

        let present = ResponseHandlerConfig::json_field("data.id", Value::Null).with_mode(MatchMode::Present);
        assert!(classify(&present, body(json!({"data": {"id": 7}}))).is_ok());
        assert!(classify(&present, body(json!({"data": {"id": null}}))).is_err());

        let regex = ResponseHandlerConfig::json_field("items.0.state", "^(ok|queued)$").with_mode(MatchMode::Regex);
        assert!(classify(&regex, body(json!({"items": [{"state": "queued"}]}))).is_ok());
        assert!(classify(&regex, body(json!({"items": [{"state": "failed"}]}))).is_err());
    }

    #[test]
    fn test_text_body_mode() {
        let config = ResponseHandlerConfig::json_field("", "^OK")
            .with_body_type(ResponseBodyType::Text)
            .with_mode(MatchMode::Regex);
        assert!(classify(&config, HttpResponse::new(200, "OK queued")).is_ok());
        assert!(classify(&config, HttpResponse::new(200, "FAIL")).is_err());
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let config = ResponseHandlerConfig::json_field("a", "(").with_mode(MatchMode::Regex);
        let err = classify(&config, HttpResponse::new(200, r#"{"a":"x"}"#)).unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));
    }

    #[test]
    fn test_metadata_extraction() {
        let config = ResponseHandlerConfig::json_field("ok", true)
            .with_metadata("message_id", "result.message_id")
            .with_metadata("missing", "result.nothing");
        let result = classify(
            &config,
            HttpResponse::new(200, r#"{"ok":true,"result":{"message_id":42}}"#),
        )
        .unwrap();
        assert_eq!(result.metadata.get("message_id").map(String::as_str), Some("42"));
        assert!(!result.metadata.contains_key("missing"));
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        let config = ResponseHandlerConfig::json_field("errcode", 0);
        assert!(classify(&config, HttpResponse::new(200, r#"{"errcode":0.0}"#)).is_ok());
    }
}
