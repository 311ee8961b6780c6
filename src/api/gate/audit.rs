use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

pub const REDACTED: &str = "[REDACTED]";

/// Logging may add at most this much to a request before it is flagged.
pub const OVERHEAD_BUDGET: Duration = Duration::from_millis(50);

static SENSITIVE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)password|token|secret|authorization").expect("sensitive key pattern")
});

// Fallback for bodies that are not valid JSON.
static SENSITIVE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)("[^"]*(?:password|token|secret|authorization)[^"]*"\s*:\s*")[^"]*(")"#)
        .expect("sensitive field pattern")
});

/// Body text safe to log: the value of every field whose key mentions a
/// credential is replaced with [`REDACTED`], at any depth.
pub fn redact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            SENSITIVE_FIELD
                .replace_all(&text, format!("${{1}}{REDACTED}${{2}}"))
                .into_owned()
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if SENSITIVE_KEY.is_match(key) {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    redact_value(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

/// One audited request.
#[derive(Debug)]
pub struct AuditRecord<'a> {
    pub method: &'a str,
    pub subject: &'a str,
    pub request_id: &'a str,
    pub duration: Duration,
    pub status: u16,
    pub body: &'a str,
}

impl AuditRecord<'_> {
    /// Emit the audit line. `overhead` is the time spent preparing it; past
    /// [`OVERHEAD_BUDGET`] the line goes out as a warning.
    pub fn emit(&self, overhead: Duration) {
        let duration_ms = self.duration.as_millis() as u64;
        if overhead > OVERHEAD_BUDGET {
            warn!(
                method = self.method,
                subject = self.subject,
                request_id = self.request_id,
                duration_ms,
                status = self.status,
                body = self.body,
                overhead_ms = overhead.as_millis() as u64,
                "request audit exceeded logging budget"
            );
        } else {
            info!(
                method = self.method,
                subject = self.subject,
                request_id = self.request_id,
                duration_ms,
                status = self.status,
                body = self.body,
                "request completed"
            );
        }
    }
}
