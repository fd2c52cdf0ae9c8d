//! Prints API responses in the session's output format.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::models::Response;
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::Value;

/// Renders `response` to stdout after applying key filters.
pub fn render_response(
    format: OutputFormat,
    response: &Response,
    filter: &[String],
    exclude: &[String],
) -> Result<()> {
    println!("{}", format_response(format, response, filter, exclude)?);
    Ok(())
}

/// Formats a response without printing it.
pub fn format_response(
    format: OutputFormat,
    response: &Response,
    filter: &[String],
    exclude: &[String],
) -> Result<String> {
    let value = apply_key_filters(Value::Object(response.clone()), filter, exclude);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&value)?),
        OutputFormat::Text => Ok(text_table(&value)),
    }
}

/// Keeps only `filter` keys (when non-empty) and drops `exclude` keys in every
/// object that holds scalar fields. Top-level envelopes such as `count` and the
/// list wrapper are walked into, not filtered.
fn apply_key_filters(value: Value, filter: &[String], exclude: &[String]) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| apply_key_filters(v, filter, exclude))
                .collect(),
        ),
        Value::Object(map) => {
            let is_leaf = map.values().all(|v| !v.is_object() && !v.is_array());
            let map = map
                .into_iter()
                .filter(|(k, _)| {
                    !is_leaf
                        || ((filter.is_empty() || filter.iter().any(|f| f.eq_ignore_ascii_case(k)))
                            && !exclude.iter().any(|e| e.eq_ignore_ascii_case(k)))
                })
                .map(|(k, v)| (k, apply_key_filters(v, filter, exclude)))
                .collect();
            Value::Object(map)
        },
        other => other,
    }
}

fn text_table(value: &Value) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Key", "Value"]);
    flatten("", value, &mut |key, val| {
        table.add_row(vec![key, val]);
    });
    table.to_string()
}

fn flatten(prefix: &str, value: &Value, emit: &mut dyn FnMut(String, String)) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(&key, v, emit);
            }
        },
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten(&format!("{}[{}]", prefix, i), v, emit);
            }
        },
        Value::String(s) => emit(prefix.to_string(), s.clone()),
        other => emit(prefix.to_string(), other.to_string()),
    }
}
