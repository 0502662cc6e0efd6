use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go in one Field/Value table; nested sections such as
/// `financing_structure` or `key_metrics` get a table each, and the yearly
/// and monthly series are laid out one row per period.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    let Value::Object(res_map) = result else {
        println!("{}", format_value(result));
        return;
    };

    let scalars: Map<String, Value> = res_map
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !scalars.is_empty() {
        print_flat_object(&scalars);
    }

    for (key, val) in res_map {
        match val {
            Value::Object(section) if is_columnar(section) => {
                println!("\n{}:", title(key));
                print_columnar(section);
            }
            Value::Object(section) => {
                println!("\n{}:", title(key));
                print_section(section);
            }
            Value::Array(rows) => {
                println!("\n{}:", title(key));
                print_array_table(rows);
            }
            _ => {}
        }
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

/// Section table; one level of nesting (e.g. assessment ratings) is
/// flattened into dotted field names.
fn print_section(section: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in section {
        match val {
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    builder.push_record([format!("{key}.{inner_key}"), format_value(inner_val)]);
                }
            }
            _ => builder.push_record([key.clone(), format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

/// An object of equal-length arrays, e.g. the yearly series.
pub(crate) fn is_columnar(section: &Map<String, Value>) -> bool {
    let mut lengths = section.values().map(|v| v.as_array().map(Vec::len));
    match lengths.next() {
        Some(Some(first)) => lengths.all(|len| len == Some(first)),
        _ => false,
    }
}

fn print_columnar(section: &Map<String, Value>) {
    let headers: Vec<String> = section.keys().cloned().collect();
    let rows = section
        .values()
        .next()
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for idx in 0..rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| {
                section
                    .get(h)
                    .and_then(|col| col.get(idx))
                    .map(format_value)
                    .unwrap_or_default()
            })
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn title(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
