use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use ontology_harness::chat::ChatModel;
use ontology_harness::config::Config;
use ontology_harness::server::{router, AppState};

/// Records every turn and echoes it back.
#[derive(Default)]
struct MockChat {
    turns: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChatModel for MockChat {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn base_url(&self) -> &str {
        "http://mock:11434"
    }

    async fn chat(&self, message: &str, context: &str) -> String {
        self.turns
            .lock()
            .unwrap()
            .push((message.to_string(), context.to_string()));
        format!("echo: {}", message)
    }

    async fn is_available(&self) -> bool {
        true
    }
}

struct TestRelay {
    _tmp: TempDir,
    storage: std::path::PathBuf,
    state: AppState,
    model: Arc<MockChat>,
}

fn setup() -> TestRelay {
    let tmp = TempDir::new().unwrap();
    let storage = tmp.path().join("ontologies");
    let uploads = tmp.path().join("uploads");
    fs::create_dir_all(&storage).unwrap();

    fs::write(
        storage.join("example_ontology.json"),
        r#"{"entities": {"product": {"name": "Widget"}}, "tags": ["alpha", "beta"]}"#,
    )
    .unwrap();
    fs::write(storage.join("core.ttl"), "@prefix ex: <http://example.org/> .").unwrap();
    fs::write(storage.join("broken.json"), "{oops").unwrap();
    fs::write(storage.join("readme.txt"), "not an ontology").unwrap();

    let mut config = Config::default();
    config.storage.ontologies_dir = storage.clone();
    config.storage.upload_dir = uploads;

    let model = Arc::new(MockChat::default());
    let state = AppState::new(config, model.clone());

    TestRelay {
        _tmp: tmp,
        storage,
        state,
        model,
    }
}

fn app(relay: &TestRelay) -> Router {
    router(relay.state.clone())
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(field: &str, file_name: &str, content: &str) -> Request<Body> {
    let boundary = "onto-test-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\
         \r\n\
         {content}\r\n\
         --{b}--\r\n",
        b = boundary,
    );
    Request::builder()
        .method("POST")
        .uri("/load-ontology")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let relay = setup();

    let (status, body) = send(app(&relay), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ontology Harness relay");
    assert_eq!(body["model_url"], "http://mock:11434");
    assert_eq!(body["model"], "mock-model");
    assert!(body["endpoints"]["chat"].as_str().unwrap().starts_with("/chat"));

    let (status, body) = send(app(&relay), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_list_ontologies_filters_extensions() {
    let relay = setup();
    let (status, body) = send(app(&relay), get("/ontologies")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"ontologies": ["broken.json", "core.ttl", "example_ontology.json"]})
    );
}

#[tokio::test]
async fn test_context_before_any_load() {
    let relay = setup();
    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    assert_eq!(body["context"], "No ontology loaded.");

    let (_, body) = send(
        app(&relay),
        post_json("/query-ontology", json!({"message": "widget"})),
    )
    .await;
    assert_eq!(body["result"], "No ontology loaded to query.");
}

#[tokio::test]
async fn test_load_from_storage_then_context_and_query() {
    let relay = setup();

    let (status, body) = send(
        app(&relay),
        post_json(
            "/load-ontology-from-storage",
            json!({"message": "example_ontology.json"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Ontology loaded successfully from storage: example_ontology.json"
    );

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    let context = body["context"].as_str().unwrap();
    let source = relay.storage.join("example_ontology.json");
    assert_eq!(
        context,
        format!(
            "Current Ontology Context:\nLoaded from: {}\n\nentities:\n  product:\n    name: Widget\ntags:\n  - alpha\n  - beta\n",
            source.display()
        )
    );

    let (_, body) = send(
        app(&relay),
        post_json("/query-ontology", json!({"message": "Name"})),
    )
    .await;
    assert_eq!(
        body["result"],
        "Found 1 matches for 'Name':\nentities.product.name: Widget"
    );

    let (_, body) = send(app(&relay), get("/registry")).await;
    assert_eq!(
        body,
        json!({"names": ["example_ontology.json"], "active": "example_ontology.json"})
    );
}

#[tokio::test]
async fn test_failed_storage_load_keeps_previous_context() {
    let relay = setup();
    assert!(relay.state.load_from_storage("core.ttl"));

    for name in ["broken.json", "readme.txt", "missing.json", ".."] {
        let (status, body) = send(
            app(&relay),
            post_json("/load-ontology-from-storage", json!({ "message": name })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", name);
        assert_eq!(body["error"], format!("Failed to load ontology: {}", name));
    }

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    assert_eq!(
        body["context"],
        format!(
            "Ontology loaded from: {}",
            relay.storage.join("core.ttl").display()
        )
    );
}

#[tokio::test]
async fn test_chat_passes_current_context() {
    let relay = setup();
    assert!(relay.state.load_from_storage("core.ttl"));

    let (status, body) = send(
        app(&relay),
        post_json("/chat", json!({"message": "What is in the core?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "echo: What is in the core?");

    let turns = relay.model.turns.lock().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].0, "What is in the core?");
    assert!(turns[0].1.starts_with("Ontology loaded from: "));
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let relay = setup();
    let (status, body) = send(app(&relay), post_json("/chat", json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(relay.model.turns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_json_ontology() {
    let relay = setup();
    let (status, body) = send(
        app(&relay),
        multipart_upload("file", "uploaded.json", r#"{"gizmo": {"color": "red"}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ontology loaded successfully from uploaded.json");

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    assert!(body["context"]
        .as_str()
        .unwrap()
        .ends_with("gizmo:\n  color: red\n"));
}

#[tokio::test]
async fn test_upload_unsupported_suffix_fails() {
    let relay = setup();
    let (status, body) = send(app(&relay), multipart_upload("file", "notes.txt", "hello")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Failed to load ontology: notes.txt");

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    assert_eq!(body["context"], "No ontology loaded.");
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let relay = setup();
    let (status, body) = send(
        app(&relay),
        multipart_upload("attachment", "a.json", "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_registry_endpoints() {
    let relay = setup();
    let second = relay.storage.join("core.ttl");

    let (_, body) = send(
        app(&relay),
        post_json(
            "/registry/load",
            json!({"name": "example", "path": "example_ontology.json"}),
        ),
    )
    .await;
    assert_eq!(body, json!({"loaded": true}));

    let (_, body) = send(
        app(&relay),
        post_json("/registry/load", json!({"name": "core", "path": "core.ttl"})),
    )
    .await;
    assert_eq!(body, json!({"loaded": true}));

    let (_, body) = send(
        app(&relay),
        post_json("/registry/load", json!({"name": "notes", "path": "readme.txt"})),
    )
    .await;
    assert_eq!(body, json!({"loaded": false}));

    let (_, body) = send(app(&relay), get("/registry")).await;
    assert_eq!(body, json!({"names": ["example", "core"], "active": "example"}));

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    assert!(body["context"].as_str().unwrap().contains("name: Widget"));

    let (_, body) = send(
        app(&relay),
        post_json("/registry/activate", json!({"name": "nope"})),
    )
    .await;
    assert_eq!(body, json!({"activated": false}));

    let (_, body) = send(
        app(&relay),
        post_json("/registry/activate", json!({"name": "core"})),
    )
    .await;
    assert_eq!(body, json!({"activated": true}));

    let (status, body) = send(app(&relay), get("/registry/core")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "core");
    assert_eq!(body["is_active"], true);
    assert_eq!(
        body["context"],
        format!("Ontology loaded from: {}", second.display())
    );

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    assert_eq!(
        body["context"],
        format!("Ontology loaded from: {}", second.display())
    );

    let (status, body) = send(app(&relay), get("/registry/notes")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_storage_loads_keep_registry_and_context_in_step() {
    let relay = setup();

    for name in ["example_ontology.json", "core.ttl"] {
        let (status, _) = send(
            app(&relay),
            post_json("/load-ontology-from-storage", json!({ "message": name })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(app(&relay), get("/registry")).await;
    assert_eq!(
        body,
        json!({"names": ["example_ontology.json", "core.ttl"], "active": "core.ttl"})
    );

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    let context = body["context"].as_str().unwrap().to_string();
    assert_eq!(
        context,
        format!(
            "Ontology loaded from: {}",
            relay.storage.join("core.ttl").display()
        )
    );

    let (_, body) = send(app(&relay), get("/registry/core.ttl")).await;
    assert_eq!(body["is_active"], true);
    assert_eq!(body["context"], context);

    // Switching back through the registry moves the served context too.
    let (_, body) = send(
        app(&relay),
        post_json("/registry/activate", json!({"name": "example_ontology.json"})),
    )
    .await;
    assert_eq!(body, json!({"activated": true}));

    let (_, body) = send(
        app(&relay),
        post_json("/query-ontology", json!({"message": "name"})),
    )
    .await;
    assert_eq!(
        body["result"],
        "Found 1 matches for 'name':\nentities.product.name: Widget"
    );
}

#[tokio::test]
async fn test_registry_load_stays_inside_storage() {
    let relay = setup();
    let outside = relay.storage.parent().unwrap().join("secret.json");
    fs::write(&outside, r#"{"api_key": "hunter2"}"#).unwrap();

    for path in [
        outside.to_str().unwrap().to_string(),
        "../secret.json".to_string(),
        "..".to_string(),
    ] {
        let (_, body) = send(
            app(&relay),
            post_json("/registry/load", json!({ "name": "x", "path": path })),
        )
        .await;
        assert_eq!(body, json!({"loaded": false}), "{}", path);
    }

    let (status, _) = send(app(&relay), get("/registry/x")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(app(&relay), get("/ontology-context")).await;
    assert_eq!(body["context"], "No ontology loaded.");
}

#[tokio::test]
async fn test_registry_load_rejects_blank_name() {
    let relay = setup();
    let (status, _) = send(
        app(&relay),
        post_json("/registry/load", json!({"name": "", "path": "a.ttl"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
