use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in priority order, first at the top of
/// the result and then inside `key_metrics`, before falling back to the first
/// field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(answer) = key_answer(result_obj) {
        println!("{}", answer);
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn key_answer(result: &Value) -> Option<String> {
    let priority_keys = ["irr", "npv", "payment", "equity_irr", "project_irr", "lcoe"];

    let map = result.as_object()?;
    let scopes = [Some(map), map.get("key_metrics").and_then(Value::as_object)];

    for scope in scopes.into_iter().flatten() {
        for key in &priority_keys {
            if let Some(val) = scope.get(*key) {
                if !val.is_null() {
                    return Some(format_minimal(val));
                }
            }
        }
    }
    None
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
