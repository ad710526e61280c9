//! End-to-end tests of the HTTP service against a mocked OpenAI API.

use async_trait::async_trait;
use rosana_desk::cli::commands::{router, AppState, ChatResponse};
use rosana_desk::config::{Prompts, Settings};
use rosana_desk::corpus::RowSource;
use rosana_desk::database::Record;
use rosana_desk::embedding::{Embedder, OpenAIEmbedder};
use rosana_desk::llm::{ChatModel, OpenAIChatModel};
use rosana_desk::orchestrator::Orchestrator;
use rosana_desk::rag::APOLOGY_MESSAGE;
use rosana_desk::DeskError;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Rows for a small store database; `venda` cannot be read.
struct StoreTables;

#[async_trait]
impl RowSource for StoreTables {
    async fn scan_table(&mut self, table: &str) -> rosana_desk::Result<Vec<Record>> {
        let rows = match table {
            "loja" => json!([
                {"id": 1, "nome": "Centro", "cidade": "Curitiba"},
                {"id": 2, "nome": "Batel", "cidade": "Curitiba"},
                {"id": 3, "nome": "Portão", "cidade": "Curitiba"}
            ]),
            "produto" => json!([{"id": 7, "nome": "Café", "preco": "12.50"}]),
            _ => return Err(DeskError::Database(format!("relation \"{}\" does not exist", table))),
        };

        Ok(serde_json::from_value(rows).unwrap())
    }
}

/// Embeds each input by keyword so retrieval order is predictable.
struct KeywordEmbeddings;

impl Respond for KeywordEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let inputs: Vec<String> = match &body["input"] {
            Value::Array(items) => items
                .iter()
                .map(|i| i.as_str().unwrap_or_default().to_string())
                .collect(),
            Value::String(s) => vec![s.clone()],
            other => panic!("unexpected embedding input: {}", other),
        };

        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let embedding = if text.contains("loja") {
                    vec![1.0, 0.0, 0.0]
                } else if text.contains("produto") {
                    vec![0.0, 1.0, 0.0]
                } else {
                    vec![0.0, 0.0, 1.0]
                };
                json!({"object": "embedding", "index": index, "embedding": embedding})
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }))
    }
}

fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop",
            "logprobs": null
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 9, "total_tokens": 129}
    })
}

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.openai.api_key = Some("sk-test".to_string());
    settings.openai.api_base = Some(server.uri());
    settings.openai.timeout_seconds = 10;
    settings.embedding.dimensions = 3;
    settings.corpus.tables = vec![
        "loja".to_string(),
        "produto".to_string(),
        "venda".to_string(),
    ];
    settings
}

/// Build the knowledge base and serve it on an ephemeral port.
async fn start_service(server: &MockServer) -> (SocketAddr, Orchestrator) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(KeywordEmbeddings)
        .mount(server)
        .await;

    let settings = settings_for(server);
    let embedder: Arc<dyn Embedder> = Arc::new(
        OpenAIEmbedder::from_settings(&settings.openai, &settings.embedding).unwrap(),
    );
    let chat_model: Arc<dyn ChatModel> =
        Arc::new(OpenAIChatModel::from_settings(&settings.openai, &settings.rag).unwrap());

    let corpus = Orchestrator::export_corpus(&settings, &mut StoreTables).await;
    let orchestrator =
        Orchestrator::with_components(settings, Prompts::default(), corpus, embedder, chat_model)
            .await
            .unwrap();

    let state = Arc::new(AppState::new(
        orchestrator.engine(),
        &orchestrator.settings().server,
    ));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, orchestrator)
}

async fn post_chat(addr: SocketAddr, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{}/chat", addr))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_startup_indexes_every_configured_table() {
    let server = MockServer::start().await;
    let (_addr, orchestrator) = start_service(&server).await;

    assert_eq!(orchestrator.index().len(), 3);
    assert_eq!(orchestrator.index().dimensions(), 3);
    assert_eq!(orchestrator.failed_tables().to_vec(), vec!["venda".to_string()]);
}

#[tokio::test]
async fn test_chat_answers_from_retrieved_context() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Contexto da Tabela 'loja'"))
        .and(body_string_contains("Quantas lojas existem?"))
        .and(body_string_contains("\"temperature\":0.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "Existem 3 lojas cadastradas.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (addr, _orchestrator) = start_service(&server).await;

    let response = post_chat(addr, json!({"message": "Quantas lojas existem?"})).await;
    assert_eq!(response.status(), 200);

    let body: ChatResponse = response.json().await.unwrap();
    assert_eq!(body.response, "Existem 3 lojas cadastradas.");
    assert_eq!(body.role, "ai");
    assert_eq!(body.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(body.error, None);
}

#[tokio::test]
async fn test_provider_error_returns_apology_with_status_200() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "param": null,
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let (addr, _orchestrator) = start_service(&server).await;

    let response = post_chat(addr, json!({"message": "Qual o produto mais caro?"})).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"response": APOLOGY_MESSAGE, "role": "ai", "error": true})
    );
}

fn rate_limited() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(json!({
        "error": {
            "message": "Rate limit reached for gpt-4o-mini",
            "type": "requests",
            "param": null,
            "code": "rate_limit_exceeded"
        }
    }))
}

async fn requests_to(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

#[tokio::test]
async fn test_rate_limited_completion_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(rate_limited())
        .expect(1)
        .mount(&server)
        .await;

    let (addr, _orchestrator) = start_service(&server).await;

    let started = Instant::now();
    let response = tokio::time::timeout(
        Duration::from_secs(20),
        post_chat(addr, json!({"message": "Quantas lojas existem?"})),
    )
    .await
    .expect("chat request should not wait on retries");
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"response": APOLOGY_MESSAGE, "role": "ai", "error": true})
    );
    assert_eq!(requests_to(&server, "/chat/completions").await, 1);
}

#[tokio::test]
async fn test_rate_limited_embeddings_fail_startup() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(rate_limited())
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let embedder: Arc<dyn Embedder> = Arc::new(
        OpenAIEmbedder::from_settings(&settings.openai, &settings.embedding).unwrap(),
    );
    let chat_model: Arc<dyn ChatModel> =
        Arc::new(OpenAIChatModel::from_settings(&settings.openai, &settings.rag).unwrap());
    let corpus = Orchestrator::export_corpus(&settings, &mut StoreTables).await;

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(20),
        Orchestrator::with_components(settings, Prompts::default(), corpus, embedder, chat_model),
    )
    .await
    .expect("startup should not wait on retries");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(result, Err(DeskError::OpenAI(_))));
    assert_eq!(requests_to(&server, "/embeddings").await, 1);
}

#[tokio::test]
async fn test_root_and_health_report_the_model() {
    let server = MockServer::start().await;
    let (addr, _orchestrator) = start_service(&server).await;
    let client = reqwest::Client::new();

    let root: Value = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        root,
        json!({"message": "Rosana Desk API", "status": "online", "model": "gpt-4o-mini"})
    );

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        health,
        json!({"status": "healthy", "model": "gpt-4o-mini", "service": "Rosana Desk RAG"})
    );
}

#[tokio::test]
async fn test_chat_without_message_is_rejected() {
    let server = MockServer::start().await;
    let (addr, _orchestrator) = start_service(&server).await;

    let response = post_chat(addr, json!({"text": "oi"})).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = MockServer::start().await;
    let (addr, _orchestrator) = start_service(&server).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
