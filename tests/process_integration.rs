//! Integration tests for the triage HTTP API.
//!
//! Each test spins up an Axum server on a random port and drives the real
//! multipart contract with reqwest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;

use mail_triage::api::triage_routes;
use mail_triage::error::LlmError;
use mail_triage::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use mail_triage::pipeline::{ArbitrationBridge, Classifier, MessageProcessor, Responder};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_UPLOAD: usize = 64 * 1024;

/// Stub LLM that answers every prompt with the same text.
struct StubLlm {
    reply: &'static str,
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: self.reply.to_string(),
        })
    }
}

/// Start a server, return its port.
async fn start_server(processor: MessageProcessor) -> u16 {
    let app = triage_routes(Arc::new(processor), MAX_UPLOAD);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

fn heuristic_only() -> MessageProcessor {
    MessageProcessor::new(
        Classifier::new(ArbitrationBridge::disabled()),
        Responder::templates_only(),
        MAX_UPLOAD,
    )
}

async fn post_form(port: u16, form: Form) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/process"))
        .multipart(form)
        .send()
        .await
        .expect("request failed");
    let status = response.status().as_u16();
    let body = response.json().await.expect("invalid JSON from server");
    (status, body)
}

const NESTED_EML: &str = concat!(
    "From: cliente@exemplo.com\r\n",
    "Subject: Fwd: pendência\r\n",
    "MIME-Version: 1.0\r\n",
    "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
    "\r\n",
    "--outer\r\n",
    "Content-Type: message/rfc822\r\n",
    "\r\n",
    "Subject: Original\r\n",
    "Content-Type: text/plain; charset=utf-8\r\n",
    "\r\n",
    "Anexo o protocolo 998877, favor validar.\r\n",
    "--outer--\r\n",
);

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(heuristic_only()).await;
        let body: Value = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn nested_eml_is_classified() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(heuristic_only()).await;
        let form = Form::new().part(
            "email_files",
            Part::bytes(NESTED_EML.as_bytes().to_vec()).file_name("encaminhado.eml"),
        );

        let (status, body) = post_form(port, form).await;
        assert_eq!(status, 200);

        let rows = body["resultados"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["categoria"], "Produtivo");
        assert_eq!(rows[0]["linguagem"], "pt");
        let terms: Vec<&str> = rows[0]["termos_relevantes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t.as_str().unwrap())
            .collect();
        assert!(terms.contains(&"protocolo"));
        assert!(terms.len() <= 6);
        let confidence = rows[0]["confianca"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn multiple_inputs_keep_order() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(heuristic_only()).await;
        let form = Form::new()
            .part(
                "email_files",
                Part::bytes(b"Bom dia! Obrigado pela atencao.".to_vec()).file_name("a.txt"),
            )
            .part(
                "email_files",
                Part::bytes(b"ignored".to_vec()).file_name("imagem.png"),
            )
            .text("email_text", "Poderia atualizar o cadastro ate sexta?");

        let (status, body) = post_form(port, form).await;
        assert_eq!(status, 200);

        let rows = body["resultados"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["categoria"], "Improdutivo");
        assert_eq!(rows[1]["categoria"], "Produtivo");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_input_returns_error_json() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(heuristic_only()).await;
        let form = Form::new().text("observacoes", "só a observação");

        let (status, body) = post_form(port, form).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Envie arquivo(s) .txt/.pdf/.eml ou cole o texto.");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreadable_files_return_error_json() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(heuristic_only()).await;
        let form = Form::new().part(
            "email_files",
            Part::bytes(b"%PDF-1.4 not really".to_vec()).file_name("quebrado.pdf"),
        );

        let (status, body) = post_form(port, form).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Não foi possível extrair texto válido.");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn model_reply_and_arbitration_are_used_when_configured() {
    timeout(TEST_TIMEOUT, async {
        let arbiter: Arc<dyn LlmProvider> = Arc::new(StubLlm {
            reply: "Improdutivo",
        });
        let writer: Arc<dyn LlmProvider> = Arc::new(StubLlm {
            reply: "Resposta: Agradecemos o contato! Ficamos à disposição. Abraços.",
        });
        let processor = MessageProcessor::new(
            Classifier::new(ArbitrationBridge::new(Some(arbiter), true)),
            Responder::new(Some(writer)),
            MAX_UPLOAD,
        );
        let port = start_server(processor).await;

        let form = Form::new().text("email_text", "obrigado, pode");
        let (status, body) = post_form(port, form).await;
        assert_eq!(status, 200);

        let row = &body["resultados"][0];
        assert_eq!(row["categoria"], "Improdutivo");
        assert_eq!(row["confianca"], 0.38);
        assert_eq!(row["resposta"], "Agradecemos o contato! Ficamos à disposição.");
    })
    .await
    .expect("test timed out");
}
