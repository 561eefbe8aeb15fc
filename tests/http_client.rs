//! `SwapiClient` against a local HTTP server.

use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use std::time::Duration;
use swapi_harvest::data::MemorySink;
use swapi_harvest::harvest::{HarvestSettings, Pipeline};
use swapi_harvest::swapi::{ClientError, ResourceKind, ResourceSource, SwapiClient};
use tokio::net::TcpListener;

async fn person(Path(id): Path<u32>) -> Response {
    match id {
        1 => axum::Json(json!({
            "name": "Luke Skywalker",
            "height": "172",
            "homeworld": "https://swapi.py4e.com/api/planets/1/",
            "films": [
                "https://swapi.py4e.com/api/films/2/",
                "https://swapi.py4e.com/api/films/1/",
            ],
        }))
        .into_response(),
        2 => (StatusCode::SERVICE_UNAVAILABLE, "upstream down").into_response(),
        3 => (StatusCode::OK, "<html>not json</html>").into_response(),
        4 => (StatusCode::NOT_FOUND, "<html>404</html>").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "detail": "Not found" })),
        )
            .into_response(),
    }
}

async fn film(Path(id): Path<u32>) -> Response {
    let title = match id {
        1 => "A New Hope",
        2 => "The Empire Strikes Back",
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    axum::Json(json!({ "title": title })).into_response()
}

async fn planet(Path(_id): Path<u32>) -> Response {
    axum::Json(json!({ "name": "Tatooine" })).into_response()
}

/// Serve a tiny SWAPI on an ephemeral port and return its base URL.
async fn serve() -> String {
    let app = Router::new()
        .route("/api/people/{id}/", get(person))
        .route("/api/films/{id}/", get(film))
        .route("/api/planets/{id}/", get(planet));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// A client that ignores any proxy configured in the environment.
fn client(base: &str) -> SwapiClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    SwapiClient::with_client(base, http).unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_object() {
    let base = serve().await;
    let payload = client(&base).fetch(ResourceKind::People, 1).await.unwrap();

    assert!(!payload.is_not_found());
    assert_eq!(payload.id(), 1);
    assert_eq!(payload.display_name(), Some("Luke Skywalker"));
}

#[tokio::test]
async fn test_not_found_is_a_payload_not_an_error() {
    let base = serve().await;
    let client = client(&base);

    let payload = client.fetch(ResourceKind::People, 17).await.unwrap();
    assert!(payload.is_not_found());
    assert_eq!(payload.get("detail"), Some(&json!("Not found")));

    // A 404 without a JSON body still carries the sentinel.
    let payload = client.fetch(ResourceKind::People, 4).await.unwrap();
    assert!(payload.is_not_found());
}

#[tokio::test]
async fn test_server_error_is_client_error() {
    let base = serve().await;
    let err = client(&base)
        .fetch(ResourceKind::People, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 503, id: 2, .. }));
}

#[tokio::test]
async fn test_non_json_body_is_parse_error() {
    let base = serve().await;
    let err = client(&base)
        .fetch(ResourceKind::People, 3)
        .await
        .unwrap_err();

    match err {
        ClientError::ParseFailed { status, url, .. } => {
            assert_eq!(status, 200);
            assert!(url.ends_with("/api/people/3/"));
        }
        other => panic!("expected a parse failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_request_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/api"))
        .fetch(ResourceKind::People, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::RequestFailed { id: 1, .. }));
}

#[tokio::test]
async fn test_pipeline_over_http() {
    let base = serve().await;
    let source = std::sync::Arc::new(client(&base));
    let mut sink = MemorySink::new();

    let summary = Pipeline::new(
        source,
        HarvestSettings {
            ids: 1..=1,
            chunk_size: 30,
            reference_concurrency: 4,
        },
    )
    .run(&mut sink)
    .await
    .unwrap();

    assert_eq!(summary.persisted, 1);
    let luke = sink.get(1).unwrap();
    assert_eq!(luke.films, "The Empire Strikes Back, A New Hope");
    assert_eq!(luke.homeworld, "Tatooine");
    assert_eq!(luke.height, "172");
    assert_eq!(luke.mass, "unknown");
}
