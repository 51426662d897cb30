use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::ROW_KEYS;

/// Format output as tables using the tabled crate. Row collections inside
/// the result (monthly schedule, stress rows, snowball years) become one
/// table each; remaining scalar fields become a field/value table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result, map);
            } else {
                print_scalars(value);
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        for key in ROW_KEYS {
            if let Some(Value::Array(rows)) = res_map.get(key) {
                if !rows.is_empty() {
                    println!("{key}:");
                    print_rows(rows);
                    println!();
                }
            }
        }

        let scalars: serde_json::Map<String, Value> = res_map
            .iter()
            .filter(|(k, v)| !ROW_KEYS.contains(&k.as_str()) && !v.is_array())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !scalars.is_empty() {
            print_scalars(&Value::Object(scalars));
        }
    } else {
        println!("{}", result);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// An array of uniformly-shaped objects becomes one table with a header row
/// taken from the first element.
fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            println!("{}", row);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_scalars(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            if val.is_object() {
                // One level of nesting (radar scores, annual summary).
                if let Value::Object(inner) = val {
                    for (ik, iv) in inner {
                        builder.push_record([format!("{key}.{ik}"), format_value(iv)]);
                    }
                }
            } else {
                builder.push_record([key.clone(), format_value(val)]);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", value);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
