//! JSON payload fixtures shaped like question manager responses

use serde_json::{Value, json};

/// Key discovery response listing the given quizpack keys
pub fn rounds_payload(keys: &[&str]) -> Value {
    let map: serde_json::Map<String, Value> = keys
        .iter()
        .map(|k| (k.to_string(), json!({ "title": format!("Round {k}") })))
        .collect();
    Value::Object(map)
}

/// A single quizpack item as the batch endpoint returns it
pub fn question(id: &str, question: &str, answer: &str) -> Value {
    json!({
        "id": id,
        "question": question,
        "answer": answer,
        "type_code": "KP",
        "obsolete": "0",
        "fav": 0,
        "publish_date": 1_700_000_000,
        "publish_date_str": "14/11/2023",
        "author_name": "Test Author",
        "user_tags": "geography",
        "image_src1": "",
    })
}

/// Batch fetch response wrapping the given items
pub fn quizpack_payload(items: Vec<Value>) -> Value {
    json!({ "data": items })
}

/// Option lookup response
pub fn options_payload(options: &[&str], long_answer: &str, short_answer: &str) -> Value {
    let mut payload = json!({
        "long_answer": long_answer,
        "short_answer": short_answer,
    });
    for (i, option) in options.iter().enumerate() {
        payload[format!("option{}", i + 1)] = json!(option);
    }
    payload
}
