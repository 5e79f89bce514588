//! Text rendering of solved configurations.

use serde_json::Value;

/// Renders a solved system as one `path = value` line per leaf, grouped by
/// device role.
pub fn render_config(config: &Value) -> String {
    let mut out = String::new();
    match config.as_object() {
        Some(roles) => {
            for (role, device) in roles {
                out.push_str(&format!("[{role}]\n"));
                flatten("", device, &mut out);
            }
        }
        None => out.push_str(&format!("{config}\n")),
    }
    out
}

fn flatten(prefix: &str, value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        Value::String(s) => out.push_str(&format!("  {prefix} = {s}\n")),
        other => out.push_str(&format!("  {prefix} = {other}\n")),
    }
}
