//! Integration tests for the hosted rule mock.
//!
//! Each test spawns a real listener on an ephemeral loopback port and talks
//! to it over HTTP with the bound `TestClient`.

use futures::future::join_all;
use reqwest::{Response, StatusCode};
use rule_mock::server::MAX_REQUEST_BODY_BYTES;
use rule_mock::{Config, FnAction, ResponseSink, TestServer};
use std::sync::Arc;

const OK_RESPONSE: &str = "[1,2]";

async fn assert_ok_response(response: Response, expected: &str) {
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), expected);
}

async fn assert_no_rule_matched(response: Response) {
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "Simon says Not Match");
}

// =============================================================================
// Predicates
// =============================================================================

#[tokio::test]
async fn test_rule_without_predicates_answers_get_and_post() {
    let server = TestServer::new();
    server.rule_set().create_rule().set_ok_response(OK_RESPONSE);
    let client = server.create_client().await.unwrap();

    assert_ok_response(client.get("/").send().await.unwrap(), OK_RESPONSE).await;
    assert_ok_response(client.post("/").send().await.unwrap(), OK_RESPONSE).await;
}

#[tokio::test]
async fn test_method_predicate() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_get()
        .set_ok_response(OK_RESPONSE);
    let client = server.create_client().await.unwrap();

    assert_ok_response(client.get("/").send().await.unwrap(), OK_RESPONSE).await;
    assert_no_rule_matched(client.post("/").send().await.unwrap()).await;
}

#[tokio::test]
async fn test_post_predicate_with_body() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_post()
        .set_ok_response(OK_RESPONSE);
    let client = server.create_client().await.unwrap();

    let response = client.post("/").body("dummy").send().await.unwrap();
    assert_ok_response(response, OK_RESPONSE).await;
}

#[tokio::test]
async fn test_url_predicate() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_get()
        .when_url_match(r"\?id=1")
        .unwrap()
        .set_ok_response(OK_RESPONSE);
    let client = server.create_client().await.unwrap();

    assert_ok_response(client.get("/?id=1").send().await.unwrap(), OK_RESPONSE).await;
    assert_no_rule_matched(client.post("/?id=2").send().await.unwrap()).await;
}

#[tokio::test]
async fn test_url_predicate_sees_host_and_scheme() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_url_match(r"^http://127\.0\.0\.1:\d+/\?q=x$")
        .unwrap()
        .set_ok_response("full url");
    let client = server.create_client().await.unwrap();

    assert_ok_response(client.get("?q=x").send().await.unwrap(), "full url").await;
}

#[tokio::test]
async fn test_authorization_predicate() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_get()
        .when_authorization_match("Bearer fancy-token")
        .unwrap()
        .set_ok_response(OK_RESPONSE);
    let client = server.create_client().await.unwrap();

    let response = client
        .get("/")
        .bearer_auth("expired-token")
        .send()
        .await
        .unwrap();
    assert_no_rule_matched(response).await;

    let response = client.get("/").bearer_auth("fancy-token").send().await.unwrap();
    assert_ok_response(response, OK_RESPONSE).await;
}

#[tokio::test]
async fn test_header_predicate_is_case_insensitive_on_name() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_header_match("X-Api-Version", "2")
        .unwrap()
        .set_ok_response("v2");
    let client = server.create_client().await.unwrap();

    let response = client
        .get("/")
        .header("x-api-version", "2")
        .send()
        .await
        .unwrap();
    assert_ok_response(response, "v2").await;

    let response = client
        .get("/")
        .header("X-Api-Version", "20")
        .send()
        .await
        .unwrap();
    assert_no_rule_matched(response).await;
}

// =============================================================================
// Actions and ordering
// =============================================================================

#[tokio::test]
async fn test_bad_request_action() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_get()
        .set_bad_request_default();
    let client = server.create_client().await.unwrap();

    let response = client.get("/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Bad Request");
}

#[tokio::test]
async fn test_second_rule_matches() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_url_match(r"\?id=1")
        .unwrap()
        .set_ok_response("first rule matched")
        .add_rule()
        .unwrap()
        .when_url_match(r"\?id=2")
        .unwrap()
        .set_ok_response("second rule matched");
    let client = server.create_client().await.unwrap();

    let response = client.get("?id=2").send().await.unwrap();
    assert_ok_response(response, "second rule matched").await;
}

#[tokio::test]
async fn test_first_registered_rule_wins() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_url_match(r"\?id=1")
        .unwrap()
        .set_ok_response("first rule matched")
        .add_rule()
        .unwrap()
        .when_url_match(r"\?id=*")
        .unwrap()
        .set_ok_response("second rule matched");
    let client = server.create_client().await.unwrap();

    let response = client.get("?id=1").send().await.unwrap();
    assert_ok_response(response, "first rule matched").await;
}

#[tokio::test]
async fn test_max_match_count_falls_through() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_get()
        .set_ok_response("only once")
        .set_max_match_count(1)
        .add_rule()
        .unwrap()
        .when_get()
        .set_bad_request("used up");
    let client = server.create_client().await.unwrap();

    assert_ok_response(client.get("/").send().await.unwrap(), "only once").await;

    let response = client.get("/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "used up");
}

#[tokio::test]
async fn test_max_match_count_falls_through_to_default() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .set_ok_response(OK_RESPONSE)
        .set_max_match_count(2);
    let client = server.create_client().await.unwrap();

    assert_ok_response(client.get("/").send().await.unwrap(), OK_RESPONSE).await;
    assert_ok_response(client.get("/").send().await.unwrap(), OK_RESPONSE).await;
    assert_no_rule_matched(client.get("/").send().await.unwrap()).await;
}

#[tokio::test]
async fn test_custom_default_action() {
    let server = TestServer::new();
    server
        .rule_set()
        .set_default_action(FnAction::new(|sink: &mut ResponseSink| {
            sink.set_status(hyper::StatusCode::SERVICE_UNAVAILABLE);
            sink.insert_header("Retry-After", "1")?;
            sink.write("try later");
            Ok(())
        }));
    let client = server.create_client().await.unwrap();

    let response = client.get("/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "1");
    assert_eq!(response.text().await.unwrap(), "try later");
}

#[tokio::test]
async fn test_failing_action_returns_500() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .set_action(FnAction::new(|_: &mut ResponseSink| {
            anyhow::bail!("stub exploded")
        }));
    let client = server.create_client().await.unwrap();

    let response = client.get("/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.unwrap().contains("stub exploded"));
}

// =============================================================================
// Hosting
// =============================================================================

#[tokio::test]
async fn test_only_root_path_is_dispatched_by_default() {
    let server = TestServer::new();
    server.rule_set().create_rule().set_ok_response(OK_RESPONSE);
    let client = server.create_client().await.unwrap();

    let response = client.get("/users").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "");
    assert_eq!(server.rule_set().match_count(0), Some(0));
    assert_eq!(client.server().request_count(), 1);
}

#[tokio::test]
async fn test_catch_all_dispatches_every_path() {
    let server = TestServer::new().with_catch_all(true);
    server
        .rule_set()
        .create_rule()
        .when_url_match("/users/42$")
        .unwrap()
        .set_ok_response("user 42");
    let client = server.create_client().await.unwrap();

    assert_ok_response(client.get("/users/42").send().await.unwrap(), "user 42").await;
    assert_no_rule_matched(client.get("/users/7").send().await.unwrap()).await;
}

#[tokio::test]
async fn test_oversized_body_is_refused_before_dispatch() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .when_post()
        .set_ok_response(OK_RESPONSE);
    let client = server.create_client().await.unwrap();

    let response = client
        .post("/")
        .body(vec![b'x'; MAX_REQUEST_BODY_BYTES + 1])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(server.rule_set().match_count(0), Some(0));

    let response = client
        .post("/")
        .body(vec![b'x'; MAX_REQUEST_BODY_BYTES])
        .send()
        .await
        .unwrap();
    assert_ok_response(response, OK_RESPONSE).await;
    assert_eq!(server.rule_set().match_count(0), Some(1));
}

#[tokio::test]
async fn test_rules_added_after_spawn_are_visible() {
    let server = TestServer::new();
    let client = server.create_client().await.unwrap();

    assert_no_rule_matched(client.get("/").send().await.unwrap()).await;

    client
        .server()
        .rule_set()
        .create_rule()
        .set_ok_response("late rule");
    assert_eq!(server.rule_set().len(), 1);
    assert_ok_response(client.get("/").send().await.unwrap(), "late rule").await;
}

#[tokio::test]
async fn test_clients_share_one_rule_set() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .set_ok_response("shared")
        .set_max_match_count(1);

    let first = server.create_client().await.unwrap();
    let second = server.create_client().await.unwrap();
    assert_ne!(first.base_url(), second.base_url());

    assert_ok_response(first.get("/").send().await.unwrap(), "shared").await;
    assert_no_rule_matched(second.get("/").send().await.unwrap()).await;
}

#[tokio::test]
async fn test_shutdown_stops_listener() {
    let server = TestServer::new();
    let handle = server.spawn().await.unwrap();
    let url = format!("{}/", handle.base_url());

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    assert_eq!(
        client.get(&url).send().await.unwrap().status(),
        StatusCode::NOT_FOUND
    );

    handle.shutdown().await;
    let fresh = reqwest::Client::builder().no_proxy().build().unwrap();
    assert!(fresh.get(&url).send().await.is_err());
}

#[tokio::test]
async fn test_shutdown_closes_keep_alive_connections() {
    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .set_ok_response("still here");
    let handle = server.spawn().await.unwrap();
    let url = format!("{}/", handle.base_url());

    // Pooled client: the second request would reuse the first connection
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    assert_ok_response(client.get(&url).send().await.unwrap(), "still here").await;
    assert_eq!(server.rule_set().match_count(0), Some(1));

    handle.shutdown().await;

    assert!(client.get(&url).send().await.is_err());
    assert_eq!(server.rule_set().match_count(0), Some(1));
}

#[tokio::test]
async fn test_server_from_config() {
    let config: Config = serde_yaml::from_str(
        r#"
default_response:
  status: 410
  body: gone
rules:
  - method: GET
    authorization: Bearer fancy-token
    response:
      status: 200
      headers:
        Content-Type: application/json
      body: "[1,2]"
    max_match_count: 1
"#,
    )
    .unwrap();
    let server = TestServer::from_config(&config).unwrap();
    let client = server.create_client().await.unwrap();

    let response = client.get("/").bearer_auth("fancy-token").send().await.unwrap();
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_ok_response(response, OK_RESPONSE).await;

    let response = client.get("/").bearer_auth("fancy-token").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(response.text().await.unwrap(), "gone");
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_respect_max_match_count() {
    const CAP: u32 = 3;
    const REQUESTS: usize = 40;

    let server = TestServer::new();
    server
        .rule_set()
        .create_rule()
        .set_ok_response("limited")
        .set_max_match_count(CAP)
        .add_rule()
        .unwrap()
        .set_bad_request("overflow");
    let client = Arc::new(server.create_client().await.unwrap());

    let responses = join_all((0..REQUESTS).map(|_| {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let response = client.get("/").send().await.unwrap();
            (response.status(), response.text().await.unwrap())
        })
    }))
    .await;

    let limited = responses
        .iter()
        .map(|r| r.as_ref().unwrap())
        .filter(|(status, body)| *status == StatusCode::OK && body == "limited")
        .count();
    let overflow = responses
        .iter()
        .map(|r| r.as_ref().unwrap())
        .filter(|(status, _)| *status == StatusCode::BAD_REQUEST)
        .count();

    assert_eq!(limited, CAP as usize);
    assert_eq!(overflow, REQUESTS - CAP as usize);
    assert_eq!(server.rule_set().match_count(0), Some(CAP));
    assert_eq!(server.rule_set().match_count(1), Some((REQUESTS as u32) - CAP));
}
