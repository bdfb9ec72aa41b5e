//! Integration tests for the axum adapter.
//!
//! Drives the router through `tower::ServiceExt::oneshot`, so no TCP socket
//! is bound.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use listener::{router, ListenerConfig, ListenerError};
use pipeline::{
    handler_fn, Context, Endpoint, EndpointConfig, EndpointError, Method, Output, Route,
    RoutePath,
};
use schema::{Field, ObjectSchema};
use serde_json::{json, Value};
use tower::ServiceExt;

// ─── Fixtures ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Principal {
    name: String,
}

fn url(path: &str) -> RoutePath {
    RoutePath::new(path).unwrap()
}

/// Resolves `"secret"` to alice and everything else to no principal.
async fn resolve(credential: String) -> Result<Option<Principal>, EndpointError> {
    Ok((credential == "secret").then(|| Principal {
        name: "alice".to_string(),
    }))
}

struct App {
    router: Router,
    me_calls: Arc<AtomicUsize>,
}

fn create_test_app() -> App {
    let me_calls = Arc::new(AtomicUsize::new(0));

    let create_widget = Endpoint::new(
        EndpointConfig::unauthenticated(
            Method::Post,
            url("/widgets"),
            handler_fn(|ctx: Context<()>| async move {
                Ok(Output::json(json!({ "name": ctx.body()["name"] })))
            }),
        )
        .schema(ObjectSchema::new().field("name", Field::string().required())),
    );

    let get_widget = Endpoint::unauthenticated(
        Method::Get,
        url("/widgets/{id}"),
        handler_fn(|ctx: Context<()>| async move {
            match ctx.param("id") {
                Some("1") => Ok(Output::json(json!({ "id": 1, "name": "gear" }))),
                _ => Err(EndpointError::domain("widget.id", "not found")),
            }
        }),
    );

    let delete_widget = Endpoint::unauthenticated(
        Method::Delete,
        url("/widgets/{id}"),
        handler_fn(|_ctx: Context<()>| async { Ok(Output::Void) }),
    );

    let calls = Arc::clone(&me_calls);
    let me = Endpoint::new(EndpointConfig::new(
        Method::Get,
        url("/me"),
        resolve,
        handler_fn(move |ctx: Context<Principal>| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Output::json(json!({ "name": ctx.token().name })))
            }
        }),
    ));

    let routes: Vec<Arc<dyn Route>> = vec![
        Arc::new(create_widget),
        Arc::new(get_widget),
        Arc::new(delete_widget),
        Arc::new(me),
    ];

    App {
        router: router(routes, ListenerConfig::default()).unwrap(),
        me_calls,
    }
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Option<Value>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ─── Tests ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_schema_violation_returns_400_envelope() {
    let app = create_test_app();

    let (status, body) = call(app.router, post_json("/widgets", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.unwrap(),
        json!({ "errors": [{ "id": "name", "message": "\"name\" is required" }] })
    );
}

#[tokio::test]
async fn test_valid_post_returns_data() {
    let app = create_test_app();

    let (status, body) = call(app.router, post_json("/widgets", json!({ "name": "gear" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({ "data": { "name": "gear" } }));
}

#[tokio::test]
async fn test_route_params_reach_the_handler() {
    let app = create_test_app();

    let (status, body) = call(app.router.clone(), get("/widgets/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({ "data": { "id": 1, "name": "gear" } }));

    let (status, body) = call(app.router, get("/widgets/2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.unwrap(),
        json!({ "errors": [{ "id": "widget.id", "message": "not found" }] })
    );
}

#[tokio::test]
async fn test_methods_share_a_url() {
    let app = create_test_app();
    let request = Request::builder()
        .method("DELETE")
        .uri("/widgets/1")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({}));
}

#[tokio::test]
async fn test_unknown_principal_is_401_without_body() {
    let app = create_test_app();
    let request = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(app.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_none());
    assert_eq!(app.me_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_bearer_header_authenticates() {
    let app = create_test_app();
    let request = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({ "data": { "name": "alice" } }));
    assert_eq!(app.me_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_query_token_authenticates() {
    let app = create_test_app();

    let (status, _body) = call(app.router, get("/me?access_token=secret")).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_rejected_before_the_pipeline() {
    let app = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/widgets")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, body) = call(app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body.unwrap();
    assert_eq!(body["errors"][0]["id"], "body");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let routes: Vec<Arc<dyn Route>> = vec![Arc::new(Endpoint::unauthenticated(
        Method::Put,
        url("/blob"),
        handler_fn(|_ctx: Context<()>| async { Ok(Output::Void) }),
    ))];
    let config = ListenerConfig {
        body_limit: 8,
        ..ListenerConfig::default()
    };
    let app = router(routes, config).unwrap();
    let request = Request::builder()
        .method("PUT")
        .uri("/blob")
        .body(Body::from(json!({ "payload": "far too long" }).to_string()))
        .unwrap();

    let (status, _body) = call(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unregistered_method_is_405() {
    let app = create_test_app();
    let request = Request::builder()
        .method("PUT")
        .uri("/me")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_duplicate_routes_are_rejected() {
    let make = || -> Arc<dyn Route> {
        Arc::new(Endpoint::unauthenticated(
            Method::Get,
            url("/dup"),
            handler_fn(|_ctx: Context<()>| async { Ok(Output::Void) }),
        ))
    };

    let err = router(vec![make(), make()], ListenerConfig::default()).unwrap_err();

    assert!(matches!(
        err,
        ListenerError::DuplicateRoute { method: Method::Get, ref url } if url == "/dup"
    ));
}

#[tokio::test]
async fn test_params_default_to_empty_map() {
    let routes: Vec<Arc<dyn Route>> = vec![Arc::new(Endpoint::unauthenticated(
        Method::Get,
        url("/params"),
        handler_fn(|ctx: Context<()>| async move {
            let params: HashMap<String, String> = ctx.params().clone();
            Ok(Output::json(params))
        }),
    ))];
    let app = router(routes, ListenerConfig::default()).unwrap();

    let (_, body) = call(app, get("/params")).await;

    assert_eq!(body.unwrap(), json!({ "data": {} }));
}

fn echo_app() -> Router {
    let routes: Vec<Arc<dyn Route>> = vec![Arc::new(Endpoint::unauthenticated(
        Method::Put,
        url("/echo"),
        handler_fn(|ctx: Context<()>| async move { Ok(Output::json(ctx.body().clone())) }),
    ))];
    router(routes, ListenerConfig::default()).unwrap()
}

#[tokio::test]
async fn test_non_json_content_type_reaches_endpoint_as_null() {
    let request = Request::builder()
        .method("PUT")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("{ \"looks\": \"like json\" }"))
        .unwrap();

    let (status, body) = call(echo_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({ "data": null }));
}

#[tokio::test]
async fn test_json_media_type_with_parameters_is_parsed() {
    let request = Request::builder()
        .method("PUT")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(json!({ "n": 1 }).to_string()))
        .unwrap();

    let (status, body) = call(echo_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({ "data": { "n": 1 } }));
}

#[tokio::test]
async fn test_query_token_is_percent_decoded() {
    let routes: Vec<Arc<dyn Route>> = vec![Arc::new(Endpoint::new(EndpointConfig::new(
        Method::Get,
        url("/who"),
        |credential: String| async move {
            Ok::<_, EndpointError>((credential == "a+b/c").then(|| Principal {
                name: "carol".to_string(),
            }))
        },
        handler_fn(|ctx: Context<Principal>| async move {
            Ok(Output::json(json!({ "name": ctx.token().name })))
        }),
    )))];
    let app = router(routes, ListenerConfig::default()).unwrap();

    let (status, body) = call(app, get("/who?access_token=a%2Bb%2Fc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({ "data": { "name": "carol" } }));
}
