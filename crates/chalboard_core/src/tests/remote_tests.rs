use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    submitted: Arc<Mutex<Vec<(i64, SubmitForm)>>>,
}

async fn handle_chals() -> Json<Value> {
    Json(json!({
        "game": [
            {"id": 1, "name": "A", "category": "web", "value": 100, "description": "x"},
            {"id": 2, "name": "B", "category": "pwn", "value": 50}
        ]
    }))
}

async fn handle_solves() -> Json<Value> {
    Json(json!({ "solves": [{"chalid": 2, "value": 50}] }))
}

async fn handle_solvers(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({ "teams": [{"id": 3, "name": format!("team-for-{id}")}] }))
}

async fn handle_submit(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Form(form): Form<SubmitForm>,
) -> Json<Value> {
    let correct = form.key == "flag{ok}";
    state.submitted.lock().await.push((id, form));
    if correct {
        Json(json!({"status": 1, "message": "Correct"}))
    } else {
        Json(json!({"status": 0, "message": "Incorrect"}))
    }
}

async fn spawn_board_server(app: Router) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn board_routes(state: ServerState) -> Router {
    Router::new()
        .route("/chals", get(handle_chals))
        .route("/solves", get(handle_solves))
        .route("/chal/:id/solves", get(handle_solvers))
        .route("/chal/:id", post(handle_submit))
        .with_state(state)
}

#[tokio::test]
async fn fetches_catalog_and_solves_into_typed_records() {
    let server_url = spawn_board_server(board_routes(ServerState::default()))
        .await
        .expect("spawn server");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let tasks = client.fetch_catalog().await.expect("catalog");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].name, "A");
    assert_eq!(tasks[1].value, 50);

    let solves = client.fetch_solves().await.expect("solves");
    assert_eq!(
        solves,
        vec![SolveRecord {
            task_id: TaskId(2),
            value: 50
        }]
    );
}

#[tokio::test]
async fn fetches_solvers_for_one_task() {
    let server_url = spawn_board_server(board_routes(ServerState::default()))
        .await
        .expect("spawn server");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let solvers = client.fetch_solvers(TaskId(7)).await.expect("solvers");
    assert_eq!(solvers.len(), 1);
    assert_eq!(solvers[0].name, "team-for-7");
    assert_eq!(solvers[0].id, Some(3));
}

#[tokio::test]
async fn submit_posts_nonce_and_key_as_form_fields() {
    let state = ServerState::default();
    let server_url = spawn_board_server(board_routes(state.clone()))
        .await
        .expect("spawn server");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let wrong = client
        .submit_attempt(TaskId(1), "guess", "n-123")
        .await
        .expect("submit");
    assert_eq!(wrong.status, 0);
    assert_eq!(wrong.message, "Incorrect");

    let right = client
        .submit_attempt(TaskId(1), "flag{ok}", "n-123")
        .await
        .expect("submit");
    assert_eq!(right.status, 1);

    let submitted = state.submitted.lock().await;
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].0, 1);
    assert_eq!(submitted[0].1.nonce, "n-123");
    assert_eq!(submitted[0].1.key, "guess");
}

#[tokio::test]
async fn missing_envelope_field_is_unexpected_shape() {
    let app = Router::new().route("/chals", get(|| async { Json(json!({ "challenges": [] })) }));
    let server_url = spawn_board_server(app).await.expect("spawn server");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let err = client.fetch_catalog().await.expect_err("must fail");
    assert!(err.is_unexpected_shape(), "unexpected error: {err}");
    assert!(err.to_string().contains("GET /chals"));
}

#[tokio::test]
async fn error_status_is_network_failure() {
    let app = Router::new().route(
        "/solves",
        get(|| async { (StatusCode::FORBIDDEN, "login required") }),
    );
    let server_url = spawn_board_server(app).await.expect("spawn server");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let err = client.fetch_solves().await.expect_err("must fail");
    assert!(err.is_network(), "unexpected error: {err}");
}

#[tokio::test]
async fn base_path_prefix_is_kept_when_joining_endpoints() {
    let app = Router::new().nest("/ctf", Router::new().route("/chals", get(handle_chals)));
    let server_url = spawn_board_server(app).await.expect("spawn server");
    let client = RemoteCatalogClient::new(&format!("{server_url}/ctf")).expect("client");

    let tasks = client.fetch_catalog().await.expect("catalog");
    assert_eq!(tasks.len(), 2);
}

#[test]
fn rejects_non_http_server_urls() {
    assert!(matches!(
        RemoteCatalogClient::new("ftp://example.com"),
        Err(BoardError::InvalidServerUrl { .. })
    ));
    assert!(matches!(
        RemoteCatalogClient::new("not a url"),
        Err(BoardError::InvalidServerUrl { .. })
    ));
}

#[test]
fn client_construction_failure_is_not_a_network_failure() {
    let source = Client::new()
        .get("not a url")
        .build()
        .expect_err("invalid request url");
    let err = BoardError::ClientBuild { source };

    assert!(!err.is_network());
    assert!(!err.is_unexpected_shape());
    assert!(err.to_string().starts_with("failed to build http client"));
}
