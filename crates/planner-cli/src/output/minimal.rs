use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first scalar field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = [
        "year_end_net",
        "payable_tax",
        "maintenance_ratio",
        "fire_ratio_pct",
        "composite",
        "payment",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(hit) = find_key(result_obj, key) {
                println!("{}", format_minimal(&hit));
                return;
            }
        }

        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_object() && !v.is_array()) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

/// Depth-first search for a field name, so e.g. `year_end_net` is found
/// inside the annual summary.
fn find_key(value: &Value, key: &str) -> Option<Value> {
    match value {
        Value::Object(map) => {
            if let Some(hit) = map.get(key) {
                if !hit.is_null() {
                    return Some(hit.clone());
                }
            }
            map.values().find_map(|v| find_key(v, key))
        }
        _ => None,
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
