//! Integration tests for the HTTP front-end
//!
//! The API is served on an ephemeral port and scrapes a wiremock server.

use serde_json::{json, Value};
use stack_scrape::api::{serve_on, AppState};
use stack_scrape::config::Config;
use stack_scrape::crawler::Coordinator;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUESTION: &str = include_str!("../fixtures/question.html");
const QUESTION_TIMELINE: &str = include_str!("../fixtures/question_timeline.html");
const PROFILE: &str = include_str!("../fixtures/profile.html");
const LISTING: &str = include_str!("../fixtures/listing.html");

fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.fetcher.rate_window_ms = 0;
    config.fetcher.retry_budget_secs = 5;
    config.fetcher.default_retry_after_secs = 0;
    config
}

fn fill(template: &str, base: &str, id: i64) -> String {
    template
        .replace("{{BASE}}", base)
        .replace("{{ID}}", &id.to_string())
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Starts the API against `config` and returns its base URL
async fn start_api(config: Config) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    let coordinator = Coordinator::from_config(&config).expect("Failed to build coordinator");
    let state = AppState::new(coordinator, &config);
    tokio::spawn(serve_on(listener, state));

    format!("http://{}", addr)
}

async fn get(url: String) -> (u16, Value) {
    let response = reqwest::get(&url).await.expect("Request failed");
    let status = response.status().as_u16();
    let text = response.text().await.expect("No body");
    let body = serde_json::from_str(&text).unwrap_or_else(|_| panic!("Not JSON: {}", text));
    (status, body)
}

fn bad_parameter(message: &str) -> Value {
    json!({
        "error_id": 400,
        "error_message": message,
        "error_name": "bad_parameter"
    })
}

#[tokio::test]
async fn test_parameter_errors() {
    let server = MockServer::start().await;
    let api = start_api(create_test_config(&server.uri())).await;

    let (status, body) = get(format!("{}/questions", api)).await;
    assert_eq!(status, 400);
    assert_eq!(body, bad_parameter("site is required"));

    let (status, body) = get(format!("{}/questions?site=stackoverflow&sort=bogus", api)).await;
    assert_eq!(status, 400);
    assert_eq!(body, bad_parameter("sort"));

    let (status, body) = get(format!("{}/questions/1?site=stackoverflow&pagesize=101", api)).await;
    assert_eq!(status, 400);
    assert_eq!(body, bad_parameter("pagesize"));

    let (status, body) = get(format!("{}/answers/1?site=stackoverflow&sort=hot", api)).await;
    assert_eq!(status, 400);
    assert_eq!(body, bad_parameter("sort"));
}

#[tokio::test]
async fn test_unknown_routes_and_bad_ids() {
    let server = MockServer::start().await;
    let api = start_api(create_test_config(&server.uri())).await;

    let no_method = json!({
        "error_id": 404,
        "error_message": "no method found with this name",
        "error_name": "no_method"
    });

    for route in ["/users", "/questions/abc", "/answers/1;x", "/questions/12/comments"] {
        let (status, body) = get(format!("{}{}?site=stackoverflow", api, route)).await;
        assert_eq!(status, 404, "route {}", route);
        assert_eq!(body, no_method, "route {}", route);
    }

    let (status, body) = get(format!("{}/questions/99999999999?site=stackoverflow", api)).await;
    assert_eq!(status, 400);
    assert_eq!(body, bad_parameter("ids"));
}

#[tokio::test]
async fn test_filter_none_and_total() {
    let server = MockServer::start().await;
    mount_page(&server, "/questions", fill(LISTING, &server.uri(), 11227809)).await;
    let api = start_api(create_test_config(&server.uri())).await;

    let (status, body) = get(format!("{}/questions?site=stackoverflow&filter=none", api)).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({}));

    let (status, body) = get(format!("{}/questions?site=stackoverflow&filter=total", api)).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"total": 24197857}));

    let (status, body) = get(format!("{}/questions?site=stackoverflow&filter=everything", api)).await;
    assert_eq!(status, 400);
    assert_eq!(body, bad_parameter("Invalid filter specified"));
}

#[tokio::test]
async fn test_question_items_shape() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/questions/11227809", fill(QUESTION, &base, 11227809)).await;
    mount_page(
        &server,
        "/posts/11227809/timeline",
        fill(QUESTION_TIMELINE, &base, 11227809),
    )
    .await;
    mount_page(&server, "/users/87234/gmannickg", PROFILE.to_string()).await;
    let api = start_api(create_test_config(&base)).await;

    let (status, body) = get(format!("{}/questions/11227809?site=stackoverflow", api)).await;
    assert_eq!(status, 200);
    assert_eq!(body["has_more"], json!(false));

    let items = body["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    let q = &items[0];
    assert_eq!(q["question_id"], json!(11227809));
    assert_eq!(q["owner"]["user_type"], json!("registered"));
    assert_eq!(q["owner"]["display_name"], json!("GManNickG"));
    assert_eq!(q["content_license"], json!("CC BY-SA 4.0"));
    assert!(q.get("body").is_none());
    assert!(q.get("closed_date").is_none());

    // Outside the requested creation window
    let (status, body) = get(format!(
        "{}/questions/11227809?site=stackoverflow&fromdate=1400000000",
        api
    ))
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"items": [], "has_more": false}));
}

#[tokio::test]
async fn test_missing_listing_is_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let api = start_api(create_test_config(&server.uri())).await;

    let (status, body) = get(format!("{}/questions?site=stackoverflow", api)).await;
    assert_eq!(status, 500);
    assert_eq!(body["error_name"], json!("internal_error"));
}

#[tokio::test]
async fn test_responses_are_dumped() {
    let server = MockServer::start().await;
    let dump_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = create_test_config(&server.uri());
    config.output.dump_dir = Some(dump_dir.path().to_string_lossy().into_owned());
    let api = start_api(config).await;

    let (status, _) = get(format!("{}/answers/1?site=stackoverflow&filter=none", api)).await;
    assert_eq!(status, 200);

    let written = std::fs::read_to_string(dump_dir.path().join("answer_ids.json"))
        .expect("Dump not written");
    assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), json!({}));
}
