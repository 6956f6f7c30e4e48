mod common;

use augmented_analytics::domain::chat::{ChatRequest, Message, ToolCall, ToolDefinition};
use augmented_analytics::domain::ports::LanguageModel;
use augmented_analytics::{AnalyticsError, GeminiClient};
use common::*;
use httpmock::prelude::*;
use serde_json::json;

fn request(messages: Vec<Message>) -> ChatRequest {
    ChatRequest {
        system_prompt: Some("You are a test agent.".to_string()),
        messages,
        tools: Vec::new(),
        temperature: 0.5,
    }
}

#[tokio::test]
async fn test_text_reply_with_api_key_header() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .header("x-goog-api-key", TEST_API_KEY)
            .body_contains("\"systemInstruction\"")
            .body_contains("You are a test agent.")
            .body_contains("\"generationConfig\"");
        then.status(200).json_body(text_response("Hello from Gemini"));
    });

    let client = GeminiClient::new(TEST_API_KEY, &llm_config(&server)).unwrap();
    let response = client
        .chat(&request(vec![Message::user("Say hello")]))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(response.content, "Hello from Gemini");
    assert!(response.tool_calls.is_empty());
    assert_eq!(response.usage.total_tokens, 160);
    assert_eq!(client.model_name(), "gemini-2.5-flash");
}

#[tokio::test]
async fn test_function_declarations_and_calls() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains("\"functionDeclarations\"")
            .body_contains("plot_histogram");
        then.status(200).json_body(function_call_response(&[(
            "plot_histogram",
            json!({"column_name": "Age"}),
        )]));
    });

    let client = GeminiClient::new(TEST_API_KEY, &llm_config(&server)).unwrap();
    let mut chat = request(vec![Message::user("Histogram of age please")]);
    chat.tools = vec![ToolDefinition::new("plot_histogram", "Creates a histogram")
        .with_string_params(&[("column_name", "column")])];

    let response = client.chat(&chat).await.unwrap();
    mock.assert();
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].name, "plot_histogram");
    assert_eq!(response.tool_calls[0].arguments["column_name"], "Age");
}

#[tokio::test]
async fn test_tool_history_is_sent_as_function_parts() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains("\"role\":\"model\"")
            .body_contains("\"functionCall\"")
            .body_contains("\"functionResponse\"")
            .body_contains("No missing values found in the DataFrame.");
        then.status(200).json_body(text_response("Nothing to clean."));
    });

    let call = ToolCall {
        id: "get_missing_values_summary_0".to_string(),
        name: "get_missing_values_summary".to_string(),
        arguments: json!({}),
    };
    let client = GeminiClient::new(TEST_API_KEY, &llm_config(&server)).unwrap();
    let response = client
        .chat(&request(vec![
            Message::user("Clean the data"),
            Message::assistant_with_tools("", vec![call.clone()]),
            Message::tool_result(&call, "No missing values found in the DataFrame."),
        ]))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(response.content, "Nothing to clean.");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(400).json_body(json!({
            "error": { "code": 400, "message": "API key not valid. Please pass a valid API key." }
        }));
    });

    let mut config = llm_config(&server);
    config.retry_attempts = 3;
    let client = GeminiClient::new("bad-key", &config).unwrap();
    let result = client.chat(&request(vec![Message::user("hi")])).await;

    mock.assert_hits(1);
    match result {
        Err(AnalyticsError::LlmApiError { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid. Please pass a valid API key.");
        }
        other => panic!("expected LlmApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(503).body("overloaded");
    });

    let mut config = llm_config(&server);
    config.retry_attempts = 2;
    let client = GeminiClient::new(TEST_API_KEY, &config).unwrap();
    let result = client.chat(&request(vec![Message::user("hi")])).await;

    mock.assert_hits(3);
    let err = result.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, AnalyticsError::LlmApiError { status: 503, .. }));
}
