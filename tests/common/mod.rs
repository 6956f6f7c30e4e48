#![allow(dead_code)]

use augmented_analytics::config::toml_config::LlmConfig;
use httpmock::MockServer;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
pub const TEST_API_KEY: &str = "test-key";

/// 含缺值與一個薪資離群值的範例資料
pub const SAMPLE_CSV: &str = "\
Name,Age,Salary,City
Alice,25,50000,New York
Bob,,62000,Boston
Carol,35,71000,New York
Dan,41,,Chicago
Eve,29,58000,
Frank,52,250000,New York
";

pub fn write_sample_csv(dir: &Path) -> PathBuf {
    let path = dir.join("employees.csv");
    std::fs::write(&path, SAMPLE_CSV).unwrap();
    path
}

pub fn llm_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        base_url: server.base_url(),
        timeout_seconds: 10,
        retry_attempts: 0,
        retry_delay_seconds: 0,
        ..LlmConfig::default()
    }
}

pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 120,
            "candidatesTokenCount": 40,
            "totalTokenCount": 160
        }
    })
}

pub fn function_call_response(calls: &[(&str, Value)]) -> Value {
    let parts: Vec<Value> = calls
        .iter()
        .map(|(name, args)| json!({ "functionCall": { "name": name, "args": args } }))
        .collect();
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": "STOP"
        }]
    })
}
