//! HTTP-level tests for the cloud and local providers against a throwaway server.

use std::time::Duration;

use ragswitch_model::ollama::{OllamaChatProvider, OllamaConfig, OllamaOptions};
use ragswitch_model::openai::{OpenAIChatProvider, OpenAIConfig};
use ragswitch_model::{GenerationProvider, GenerationRequest, LlmProvider, ModelError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

enum Step {
    Write(String),
    Sleep(Duration),
}

/// Serve exactly one connection: capture the raw request, then play `steps`.
async fn serve_once(steps: Vec<Step>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        for step in steps {
            match step {
                Step::Write(data) => {
                    socket.write_all(data.as_bytes()).await.unwrap();
                    socket.flush().await.unwrap();
                }
                Step::Sleep(duration) => tokio::time::sleep(duration).await,
            }
        }
        let _ = socket.shutdown().await;
        request
    });
    (base_url, handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        let n = socket.read(&mut tmp).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn ndjson_head() -> Step {
    Step::Write(
        "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nConnection: close\r\n\r\n"
            .to_string(),
    )
}

fn json_response(status: &str, body: &str) -> Step {
    Step::Write(format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ))
}

fn fragment(content: &str, done: bool) -> Step {
    Step::Write(format!(
        "{{\"message\":{{\"role\":\"assistant\",\"content\":\"{content}\"}},\"done\":{done}}}\n"
    ))
}

fn request(temperature: f32, max_tokens: u32) -> GenerationRequest {
    GenerationRequest {
        system_prompt: "You answer questions from the provided context.".into(),
        user_prompt: "What is Ollama?".into(),
        temperature,
        max_tokens,
    }
}

// ── Ollama ──────────────────────────────────────────────────────────

#[tokio::test]
async fn ollama_folds_streamed_fragments() {
    let (base_url, server) = serve_once(vec![
        ndjson_head(),
        fragment("Runs ", false),
        Step::Sleep(Duration::from_millis(20)),
        fragment("locally.", false),
        fragment("", true),
    ])
    .await;

    let provider = OllamaChatProvider::new(
        OllamaConfig::new("tinyllama")
            .with_base_url(base_url)
            .with_options(OllamaOptions::cpu_fast()),
    )
    .unwrap();

    let answer = provider.generate(&request(0.5, 64)).await.unwrap();
    assert_eq!(answer, "Runs locally.");
    assert_eq!(provider.model_name(), "tinyllama");
    assert_eq!(provider.kind(), LlmProvider::Local);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/chat "));
    assert!(raw.contains("\"stream\":true"));
    assert!(raw.contains("\"model\":\"tinyllama\""));
    assert!(raw.contains("\"num_predict\":64"));
    assert!(raw.contains("\"temperature\":0.5"));
    assert!(raw.contains("\"num_ctx\":2048"));
    assert!(raw.contains("\"role\":\"system\""));
}

#[tokio::test]
async fn ollama_times_out_without_completion() {
    let (base_url, _server) = serve_once(vec![
        ndjson_head(),
        Step::Write("{\"message\":{\"content\":\"slow\"},\"done\":false}\n".into()),
        Step::Sleep(Duration::from_secs(10)),
    ])
    .await;

    let provider = OllamaChatProvider::new(
        OllamaConfig::new("llama3")
            .with_base_url(base_url)
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = provider.generate(&request(0.7, 500)).await.unwrap_err();
    match err {
        ModelError::Timeout { elapsed, .. } => assert!(elapsed >= Duration::from_millis(200)),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn ollama_non_success_status_is_provider_error() {
    let body = r#"{"error":"model \"llama9\" not found"}"#;
    let (base_url, _server) = serve_once(vec![json_response("404 Not Found", body)]).await;

    let provider =
        OllamaChatProvider::new(OllamaConfig::new("llama9").with_base_url(base_url)).unwrap();
    let err = provider.generate(&request(0.7, 500)).await.unwrap_err();
    assert!(matches!(err, ModelError::Provider { .. }));
    let message = err.to_string();
    assert!(message.contains("404"), "{message}");
    assert!(message.contains("llama9"), "{message}");
}

#[tokio::test]
async fn ollama_unreachable_server_is_provider_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let provider =
        OllamaChatProvider::new(OllamaConfig::new("llama3").with_base_url(base_url)).unwrap();
    let err = provider.generate(&request(0.7, 500)).await.unwrap_err();
    assert!(matches!(err, ModelError::Provider { .. }), "{err:?}");
}

#[tokio::test]
async fn ollama_lists_installed_models() {
    let body = concat!(
        r#"{"models":["#,
        r#"{"name":"llama3:latest","size":4661224676,"modified_at":"2024-05-01T10:00:00Z"},"#,
        r#"{"name":"tinyllama:latest","size":637700138,"modified_at":"2024-05-02T10:00:00Z"}"#,
        r#"]}"#,
    );
    let (base_url, server) = serve_once(vec![json_response("200 OK", body)]).await;

    let provider =
        OllamaChatProvider::new(OllamaConfig::new("llama3").with_base_url(base_url)).unwrap();
    let models = provider.list_models().await.unwrap();

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "llama3:latest");
    assert_eq!(models[1].size, 637_700_138);
    assert!(server.await.unwrap().starts_with("GET /api/tags "));
}

// ── OpenAI ──────────────────────────────────────────────────────────

#[tokio::test]
async fn openai_returns_first_choice() {
    let body = concat!(
        r#"{"id":"chatcmpl-1","choices":[{"index":0,"#,
        r#""message":{"role":"assistant","content":"Ollama runs models locally."},"#,
        r#""finish_reason":"stop"}]}"#,
    );
    let (base_url, server) = serve_once(vec![json_response("200 OK", body)]).await;

    let provider = OpenAIChatProvider::new(
        OpenAIConfig::new("sk-test", "gpt-4o-mini").with_base_url(format!("{base_url}/v1")),
    )
    .unwrap();

    let answer = provider.generate(&request(0.2, 500)).await.unwrap();
    assert_eq!(answer, "Ollama runs models locally.");
    assert_eq!(provider.kind(), LlmProvider::Cloud);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /v1/chat/completions "));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    assert!(raw.contains("\"max_tokens\":500"));
    assert!(raw.contains("\"model\":\"gpt-4o-mini\""));
}

#[tokio::test]
async fn openai_without_key_fails_before_network() {
    // Port 9 (discard) would refuse; the auth check must trip first.
    let config = OpenAIConfig { api_key: None, ..Default::default() }
        .with_base_url("http://127.0.0.1:9/v1");
    let provider = OpenAIChatProvider::new(config).unwrap();

    let err = provider.generate(&request(0.7, 500)).await.unwrap_err();
    assert!(matches!(err, ModelError::Auth { .. }), "{err:?}");
}

#[tokio::test]
async fn openai_http_error_carries_api_message() {
    let body =
        r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
    let (base_url, _server) = serve_once(vec![json_response("401 Unauthorized", body)]).await;

    let config = OpenAIConfig::new("sk-bad", "gpt-3.5-turbo").with_base_url(base_url);
    let provider = OpenAIChatProvider::new(config).unwrap();
    let err = provider.generate(&request(0.7, 500)).await.unwrap_err();

    assert!(matches!(err, ModelError::Provider { .. }));
    let message = err.to_string();
    assert!(message.contains("401"), "{message}");
    assert!(message.contains("Incorrect API key provided"), "{message}");
}

#[tokio::test]
async fn openai_malformed_body_is_provider_error() {
    let (base_url, _server) = serve_once(vec![json_response("200 OK", r#"{"choices":[]}"#)]).await;

    let config = OpenAIConfig::new("sk-test", "gpt-3.5-turbo").with_base_url(base_url);
    let provider = OpenAIChatProvider::new(config).unwrap();
    let err = provider.generate(&request(0.7, 500)).await.unwrap_err();
    assert!(err.to_string().contains("no message content"), "{err}");
}
