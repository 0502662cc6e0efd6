use serde_json::{Map, Value};
use std::io;

use super::table::is_columnar;

/// Write output as CSV to stdout.
///
/// A model result with a yearly series is written one row per year; any
/// other result becomes a two-column field/value listing with nested fields
/// flattened to dotted paths.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => match map.get("yearly_data") {
            Some(Value::Object(yearly)) if is_columnar(yearly) => write_columnar_csv(&mut wtr, yearly),
            _ => {
                let _ = wtr.write_record(["field", "value"]);
                let mut rows = Vec::new();
                flatten("", result, &mut rows);
                for (key, val) in rows {
                    let _ = wtr.write_record([key, val]);
                }
            }
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, val, rows);
            }
        }
        _ => rows.push((prefix.to_string(), format_csv_value(value))),
    }
}

fn write_columnar_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, section: &Map<String, Value>) {
    let headers: Vec<&str> = section.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    let rows = section
        .values()
        .next()
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    for idx in 0..rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| {
                section
                    .get(*h)
                    .and_then(|col| col.get(idx))
                    .map(format_csv_value)
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&row);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
