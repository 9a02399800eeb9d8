//! Mock question manager server helpers

use std::path::PathBuf;
use std::time::Duration;

use quizpack_harvest::Config;
use quizpack_harvest::client::{OPTIONS_PATH, QUIZPACK_PATH, ROUNDS_PATH};
use serde_json::Value;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session cookie every test config authenticates with
pub const TEST_SESSION: &str = "integration-session";

/// Config pointing at `server`, writing to `output`
pub fn config_for(server: &MockServer, output: PathBuf, categories: &[&str]) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.session_cookie = TEST_SESSION.to_string();
    config.api.options_timeout = Duration::from_millis(300);
    config.pipeline.categories = categories.iter().map(|c| c.to_string()).collect();
    config.output_path = output;
    config
}

/// Serve `body` for key discovery under `filter`
pub async fn mount_rounds(server: &MockServer, filter: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(ROUNDS_PATH))
        .and(query_param("data", filter))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve `status` for key discovery under `filter`
pub async fn mount_rounds_status(server: &MockServer, filter: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(ROUNDS_PATH))
        .and(query_param("data", filter))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve `response` for the batch fetch of `key`
pub async fn mount_quizpack(server: &MockServer, key: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(QUIZPACK_PATH))
        .and(body_string_contains(format!("str={key}&")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Serve `response` for the option lookup of record `id`
pub async fn mount_options(server: &MockServer, id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(OPTIONS_PATH))
        .and(query_param("id", id))
        .respond_with(response)
        .mount(server)
        .await;
}

/// 200 response with a JSON body
pub fn json_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Read the written CSV back as rows of cells, header excluded
pub fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("output CSV should be readable");
    reader
        .records()
        .map(|r| {
            r.expect("valid CSV row")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}
