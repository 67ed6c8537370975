use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use quizcard_backend::{
    build_router,
    config::{CompletionConfig, Config, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT},
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

const LECTURE: &str = "The mitochondria is the powerhouse of the cell. \
    Ribosomes assemble proteins from amino acid chains. \
    Ok. \
    The nucleus stores the genetic material of eukaryotic cells. \
    Cell membranes control what enters and leaves the cell.";

#[derive(Clone, Copy)]
enum StubMode {
    Answer,
    ServerError,
    Malformed,
}

#[derive(Clone)]
struct Stub {
    mode: StubMode,
    seen: Arc<Mutex<Vec<(Option<String>, JsonValue)>>>,
}

async fn stub_chat(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.seen.lock().unwrap().push((auth, body));

    match stub.mode {
        StubMode::Answer => Json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Q. Which organelle produces ATP?\nA) Nucleus\nB) Mitochondria\nC) Ribosome\nD) Membrane"
                }
            }]
        }))
        .into_response(),
        StubMode::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        StubMode::Malformed => Json(json!({ "result": "nothing useful" })).into_response(),
    }
}

async fn spawn_stub(mode: StubMode) -> (String, Stub) {
    let stub = Stub {
        mode,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/chat/completions", post(stub_chat))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    (format!("http://{}", addr), stub)
}

fn test_config(api_key: Option<&str>, base_url: &str, script_path: PathBuf) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        completion: CompletionConfig {
            api_key: api_key.map(str::to_string),
            base_url: url::Url::parse(base_url).expect("base url"),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        },
        script_path,
        max_upload_mb: 5,
        http_timeout_secs: 5,
    }
}

fn app_for(config: &Config) -> Router {
    build_router(AppState::new(config).expect("app state"))
}

fn offline_app() -> Router {
    app_for(&test_config(
        None,
        "http://127.0.0.1:9",
        PathBuf::from("missing/script.txt"),
    ))
}

async fn body_json(resp: Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(filename: &str, content: &[u8], num_questions: Option<&str>) -> Request<Body> {
    let boundary = "quizcardboundary";
    let mut body = Vec::new();
    if let Some(n) = num_questions {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"num_questions\"\r\n\r\n{n}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/quiz/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_fallback_mode() {
    let resp = offline_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ai_enabled"], false);
}

#[tokio::test]
async fn extract_endpoint_splits_lettered_options() {
    let resp = offline_app()
        .oneshot(json_request(
            "/api/quiz/extract",
            json!({ "content": "What is 2+2?\nA) 3\nB) 4\nC) 5\nD) 6" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["question"], "What is 2+2?");
    assert_eq!(body["answer"], "A) 3\nB) 4\nC) 5\nD) 6");
    assert_eq!(body["view"]["kind"], "options");
    assert_eq!(body["view"]["value"].as_array().unwrap().len(), 4);
    assert_eq!(body["view"]["value"][1]["label"], "B)");
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn extract_endpoint_rejects_empty_content() {
    let resp = offline_app()
        .oneshot(json_request("/api/quiz/extract", json!({ "content": "" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_api_key_skips_network_and_falls_back() {
    let (base_url, stub) = spawn_stub(StubMode::Answer).await;
    let app = app_for(&test_config(None, &base_url, PathBuf::from("missing.txt")));

    let resp = app
        .oneshot(json_request("/api/quiz/generate", json!({ "text": LECTURE })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["count"], 1);
    let question = body["questions"][0]["question"].as_str().unwrap();
    assert!(question.starts_with("What does this mean: \""));
    assert!(stub.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn completion_answer_becomes_single_card() {
    let (base_url, stub) = spawn_stub(StubMode::Answer).await;
    let app = app_for(&test_config(
        Some("pplx-test"),
        &base_url,
        PathBuf::from("missing.txt"),
    ));

    let long_text = format!("{}{}", LECTURE, "x".repeat(6000));
    let resp = app
        .oneshot(json_request("/api/quiz/generate", json!({ "text": long_text })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["source"], "ai");
    assert_eq!(body["questions"][0]["question"], "Which organelle produces ATP?");
    assert_eq!(
        body["questions"][0]["answer"],
        "A) Nucleus\nB) Mitochondria\nC) Ribosome\nD) Membrane"
    );

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, request) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer pplx-test"));
    assert_eq!(request["model"], DEFAULT_MODEL);
    assert_eq!(request["messages"][0]["role"], "system");
    let user = request["messages"][1]["content"].as_str().unwrap();
    let prefix = "Generate a quiz based on this content: ";
    assert!(user.starts_with(prefix));
    assert_eq!(user[prefix.len()..].chars().count(), 4000);
}

#[tokio::test]
async fn server_error_falls_back_instead_of_failing() {
    let (base_url, stub) = spawn_stub(StubMode::ServerError).await;
    let app = app_for(&test_config(
        Some("pplx-test"),
        &base_url,
        PathBuf::from("missing.txt"),
    ));

    let resp = app
        .oneshot(json_request("/api/quiz/generate", json!({ "text": LECTURE })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["count"], 1);
    assert_eq!(stub.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_completion_falls_back() {
    let (base_url, _stub) = spawn_stub(StubMode::Malformed).await;
    let app = app_for(&test_config(
        Some("pplx-test"),
        &base_url,
        PathBuf::from("missing.txt"),
    ));

    let resp = app
        .oneshot(json_request("/api/quiz/generate", json!({ "text": LECTURE })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["source"], "fallback");
}

#[tokio::test]
async fn unusable_text_reports_no_questions() {
    let resp = offline_app()
        .oneshot(json_request("/api/quiz/generate", json!({ "text": "Hi. Bye." })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["error"], "No questions generated");
}

#[tokio::test]
async fn generate_without_text_reads_script_file() {
    let script = std::env::temp_dir().join(format!("quizcard_script_{}.txt", uuid::Uuid::new_v4()));
    std::fs::write(&script, LECTURE).unwrap();

    let app = app_for(&test_config(None, "http://127.0.0.1:9", script.clone()));
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/quiz/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    std::fs::remove_file(&script).ok();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["count"], 1);
}

#[tokio::test]
async fn missing_script_file_is_not_found() {
    let resp = offline_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/quiz/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn text_upload_generates_requested_count() {
    let resp = offline_app()
        .oneshot(multipart_request("notes.txt", LECTURE.as_bytes(), Some("2")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["count"], 2);
    let questions = body["questions"].as_array().unwrap();
    assert_ne!(questions[0]["question"], questions[1]["question"]);
    assert_ne!(questions[0]["id"], questions[1]["id"]);
}

#[tokio::test]
async fn upload_defaults_to_ten_questions_capped_by_sentences() {
    let resp = offline_app()
        .oneshot(multipart_request("notes.txt", LECTURE.as_bytes(), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["count"], 4);
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let resp = offline_app()
        .oneshot(multipart_request("slides.pptx", b"PK\x03\x04", Some("3")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body_json(resp).await["error"],
        "Unsupported file format. Please upload a Word (.docx) or PDF file."
    );
}

#[tokio::test]
async fn fake_pdf_is_rejected_before_parsing() {
    let resp = offline_app()
        .oneshot(multipart_request("scan.pdf", b"not a pdf", Some("3")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn question_count_out_of_range_is_rejected() {
    for n in ["0", "51"] {
        let resp = offline_app()
            .oneshot(multipart_request("notes.txt", LECTURE.as_bytes(), Some(n)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "num_questions={n}");
    }
}

#[tokio::test]
async fn generate_rejects_get() {
    let resp = offline_app()
        .oneshot(
            Request::builder()
                .uri("/api/quiz/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
