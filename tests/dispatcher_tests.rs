//! End-to-end tests for the request dispatcher: route resolution order,
//! authentication gating, input validation, redirect/error encoding and
//! CORS preflight handling.

use fnroute::reply::Reply;
use fnroute::route::Route;
use fnroute::router::RouteSet;
use fnroute::server::{ParsedRequest, RequestBody};
use fnroute::{Dispatcher, Error};
use http::Method;
use serde_json::{json, Value};

mod common;

fn dispatcher(routes: Vec<(&str, Route)>) -> Dispatcher {
    common::init_tracing();
    Dispatcher::new(
        RouteSet::define("testfn", routes),
        common::offline_authenticator(),
    )
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body should be JSON")
}

fn id_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "id": { "type": "string" } },
        "required": ["id"]
    })
}

#[tokio::test]
async fn test_scenario_a_path_param_extraction() {
    let d = dispatcher(vec![(
        "get_user",
        Route::get_with_params("/users/:id", id_schema())
            .with_auth_disabled()
            .public_action(|req| async move { Ok(Reply::ok(json!({ "id": req.params["id"] }))) }),
    )]);

    let response = d
        .dispatch(ParsedRequest::new(Method::GET, "/users/42"))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body_json(&response.body)["id"], "42");
}

#[tokio::test]
async fn test_scenario_b_segment_count_mismatch_is_rejected() {
    let d = dispatcher(vec![(
        "get_user",
        Route::get_with_params("/users/:id", id_schema())
            .with_auth_disabled()
            .public_action(|req| async move { Ok(Reply::ok(json!({ "id": req.params["id"] }))) }),
    )]);

    let response = d
        .dispatch(ParsedRequest::new(Method::GET, "/users/42/extra"))
        .await;
    assert_eq!(response.status, 405);
    assert!(body_json(&response.body)["error"].is_string());
}

#[tokio::test]
async fn test_scenario_c_missing_bearer_token_is_401() {
    let d = dispatcher(vec![(
        "whoami",
        Route::get("/whoami")
            .action(|_req, auth| async move { Ok(Reply::ok(json!({ "sub": auth.principal.subject }))) }),
    )]);

    let response = d.dispatch(ParsedRequest::new(Method::GET, "/whoami")).await;
    assert_eq!(response.status, 401);
    assert!(body_json(&response.body)["error"]
        .as_str()
        .expect("error message")
        .contains("Authorization"));
}

#[tokio::test]
async fn test_scenario_d_redirect_bypasses_json_encoding() {
    let d = dispatcher(vec![(
        "finish",
        Route::get("/done")
            .with_auth_disabled()
            .public_action(|_req| async move { Ok(Reply::redirect("https://example.com/done")) }),
    )]);

    let response = d.dispatch(ParsedRequest::new(Method::GET, "/done")).await;
    assert_eq!(response.status, 302);
    assert_eq!(
        response.get_header("Location"),
        Some("https://example.com/done")
    );
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_scenario_e_missing_required_body_field_names_it() {
    let d = dispatcher(vec![(
        "create_widget",
        Route::post("/widgets")
            .with_auth_disabled()
            .with_body_schema(json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }))
            .public_action(|req| async move { Ok(Reply::created(req.body)) }),
    )]);

    let response = d
        .dispatch(ParsedRequest::new(Method::POST, "/widgets").with_json_body(json!({})))
        .await;
    assert_eq!(response.status, 400);
    let message = body_json(&response.body)["error"]
        .as_str()
        .expect("error message")
        .to_string();
    assert!(message.contains("name"), "message should name the field: {message}");
}

#[tokio::test]
async fn test_first_registered_route_wins_for_overlapping_patterns() {
    let name_schema = json!({
        "type": "object",
        "properties": { "name": { "type": "string" } }
    });
    let d = dispatcher(vec![
        (
            "by_id",
            Route::get_with_params("/users/:id", id_schema())
                .with_auth_disabled()
                .public_action(|_req| async move { Ok(Reply::ok(json!({ "via": "by_id" }))) }),
        ),
        (
            "by_name",
            Route::get_with_params("/users/:name", name_schema)
                .with_auth_disabled()
                .public_action(|_req| async move { Ok(Reply::ok(json!({ "via": "by_name" }))) }),
        ),
    ]);

    let response = d
        .dispatch(ParsedRequest::new(Method::GET, "/users/alice"))
        .await;
    assert_eq!(body_json(&response.body)["via"], "by_id");
}

#[tokio::test]
async fn test_options_preflight_short_circuits_with_cors() {
    let d = dispatcher(vec![(
        "whoami",
        Route::get("/whoami")
            .action(|_req, _auth| async move { Ok(Reply::ok(json!({}))) }),
    )]);

    // Preflight succeeds even though the route would require auth.
    let response = d
        .dispatch(ParsedRequest::new(Method::OPTIONS, "/whoami"))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.get_header("Access-Control-Allow-Origin"), Some("*"));
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_every_response_carries_cors_headers() {
    let d = dispatcher(vec![(
        "ping",
        Route::get("/ping")
            .with_auth_disabled()
            .public_action(|_req| async move { Ok(Reply::ok(json!({ "pong": true }))) }),
    )]);

    let ok = d.dispatch(ParsedRequest::new(Method::GET, "/ping")).await;
    assert_eq!(ok.get_header("Access-Control-Allow-Origin"), Some("*"));

    let miss = d.dispatch(ParsedRequest::new(Method::GET, "/nope")).await;
    assert_eq!(miss.status, 405);
    assert_eq!(miss.get_header("Access-Control-Allow-Origin"), Some("*"));
}

#[tokio::test]
async fn test_namespace_prefixed_request_paths_resolve() {
    let d = dispatcher(vec![(
        "get_user",
        Route::get_with_params("/users/:id", id_schema())
            .with_auth_disabled()
            .public_action(|req| async move { Ok(Reply::ok(json!({ "id": req.params["id"] }))) }),
    )]);

    let response = d
        .dispatch(ParsedRequest::new(Method::GET, "/testfn/users/42"))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body_json(&response.body)["id"], "42");
}

#[tokio::test]
async fn test_reset_action_dispatches_as_not_implemented() {
    let route = Route::get("/ping")
        .with_auth_disabled()
        .public_action(|_req| async move { Ok(Reply::ok(json!({}))) })
        .with_query_schema(json!({ "type": "object" }));
    let d = dispatcher(vec![("ping", route)]);

    let response = d.dispatch(ParsedRequest::new(Method::GET, "/ping")).await;
    assert_eq!(response.status, 501);
    assert_eq!(body_json(&response.body)["error"], "Not implemented");
}

#[tokio::test]
async fn test_undeclared_query_params_are_rejected() {
    let d = dispatcher(vec![(
        "ping",
        Route::get("/ping")
            .with_auth_disabled()
            .public_action(|_req| async move { Ok(Reply::ok(json!({}))) }),
    )]);

    let response = d
        .dispatch(ParsedRequest::new(Method::GET, "/ping").with_query("verbose", "true"))
        .await;
    assert_eq!(response.status, 400);
    assert!(body_json(&response.body)["error"]
        .as_str()
        .expect("error message")
        .contains("verbose"));
}

#[tokio::test]
async fn test_query_params_are_coerced_per_schema() {
    let d = dispatcher(vec![(
        "list",
        Route::get("/items")
            .with_query_schema(json!({
                "type": "object",
                "properties": { "limit": { "type": "integer" } },
                "required": ["limit"]
            }))
            .with_auth_disabled()
            .public_action(|req| async move { Ok(Reply::ok(json!({ "limit": req.query["limit"] }))) }),
    )]);

    let response = d
        .dispatch(ParsedRequest::new(Method::GET, "/items").with_query("limit", "25"))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body_json(&response.body)["limit"], 25);
}

#[tokio::test]
async fn test_malformed_body_is_a_400_parse_error() {
    let d = dispatcher(vec![(
        "create",
        Route::post("/items")
            .with_auth_disabled()
            .public_action(|_req| async move { Ok(Reply::created(json!({}))) }),
    )]);

    let mut request = ParsedRequest::new(Method::POST, "/items");
    request.body = RequestBody::Invalid("expected value at line 1 column 1".to_string());
    let response = d.dispatch(request).await;
    assert_eq!(response.status, 400);
    assert!(body_json(&response.body)["error"]
        .as_str()
        .expect("error message")
        .contains("malformed"));
}

#[tokio::test]
async fn test_bodyless_post_with_default_schema_succeeds() {
    let d = dispatcher(vec![(
        "touch",
        Route::post("/touch")
            .with_auth_disabled()
            .public_action(|req| async move { Ok(Reply::ok(json!({ "body": req.body }))) }),
    )]);

    let response = d.dispatch(ParsedRequest::new(Method::POST, "/touch")).await;
    assert_eq!(response.status, 200);
    assert_eq!(body_json(&response.body)["body"], json!({}));
}

#[tokio::test]
async fn test_explicit_handler_error_is_surfaced_verbatim() {
    let d = dispatcher(vec![(
        "teapot",
        Route::get("/brew")
            .with_auth_disabled()
            .public_action(|_req| async move {
                Err::<Reply, _>(Error::http(418, "I'm a teapot"))
            }),
    )]);

    let response = d.dispatch(ParsedRequest::new(Method::GET, "/brew")).await;
    assert_eq!(response.status, 418);
    assert_eq!(body_json(&response.body)["error"], "I'm a teapot");
}

#[tokio::test]
async fn test_raw_reply_passes_through_unchanged() {
    use fnroute::HttpResponse;

    let d = dispatcher(vec![(
        "csv",
        Route::get("/export")
            .with_auth_disabled()
            .public_action(|_req| async move {
                let mut response = HttpResponse::empty(200);
                response.set_header("Content-Type", "text/csv".to_string());
                response.body = b"a,b\n1,2\n".to_vec();
                Ok(Reply::Raw(response))
            }),
    )]);

    let response = d.dispatch(ParsedRequest::new(Method::GET, "/export")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.get_header("Content-Type"), Some("text/csv"));
    assert_eq!(response.body, b"a,b\n1,2\n");
}

#[tokio::test]
async fn test_internal_error_is_a_500_with_message() {
    let d = dispatcher(vec![(
        "boom",
        Route::get("/boom")
            .with_auth_disabled()
            .public_action(|_req| async move {
                Err::<Reply, _>(Error::internal("downstream exploded"))
            }),
    )]);

    let response = d.dispatch(ParsedRequest::new(Method::GET, "/boom")).await;
    assert_eq!(response.status, 500);
    assert_eq!(body_json(&response.body)["error"], "downstream exploded");
}
