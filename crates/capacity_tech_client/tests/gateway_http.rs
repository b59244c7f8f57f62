//! HttpTechnologiesGateway against a stub technology service on a local port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use capacity_core::error::{CapacityError, TechnicalMessage};
use capacity_core::model::SortOrder;
use capacity_core::ports::TechnologiesGateway;
use capacity_tech_client::resilience::{CircuitBreakerConfig, CircuitStatus, RetryConfig};
use capacity_tech_client::{HttpTechnologiesGateway, TechnologyClientConfig};

#[derive(Clone, Default)]
struct Stub {
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<Value>>>,
}

impl Stub {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn record(&self, body: Value) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().unwrap().push(body);
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base_url: String) -> TechnologyClientConfig {
    TechnologyClientConfig {
        timeout: Duration::from_millis(300),
        retry: RetryConfig {
            max_attempts: 3,
            wait: Duration::from_millis(1),
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_rate_threshold: 50,
            window_size: 4,
            min_calls: 2,
            open_duration: Duration::from_secs(60),
            half_open_calls: 1,
        },
        ..TechnologyClientConfig::new(base_url)
    }
}

fn gateway(base_url: String) -> HttpTechnologiesGateway {
    HttpTechnologiesGateway::new(config(base_url)).unwrap()
}

fn happy_router(stub: Stub) -> Router {
    Router::new()
        .route(
            "/assign",
            post(|State(stub): State<Stub>, Json(body): Json<Value>| async move {
                stub.record(body);
                StatusCode::OK
            }),
        )
        .route(
            "/capabilities_ids",
            post(|State(stub): State<Stub>, Json(body): Json<Value>| async move {
                stub.record(body);
                Json(json!([
                    {"id": 1, "technologies": [{"id": 10, "name": "Rust"}, {"id": 11, "name": "Go"}]},
                    {"id": 2}
                ]))
            }),
        )
        .route(
            "/capabilities",
            get(
                |State(stub): State<Stub>, Query(query): Query<Value>| async move {
                    stub.hits.fetch_add(1, Ordering::SeqCst);
                    stub.queries.lock().unwrap().push(query);
                    Json(json!({
                        "data": [{"id": 3, "technologies": [{"id": 10, "name": "Rust"}]}],
                        "page": 1,
                        "size": 1,
                        "totalItems": 5,
                        "totalPages": 5
                    }))
                },
            )
            .delete(|State(stub): State<Stub>, Json(body): Json<Value>| async move {
                stub.record(body);
                StatusCode::OK
            }),
        )
        .with_state(stub)
}

#[tokio::test]
async fn assign_posts_camel_case_body() {
    let stub = Stub::default();
    let gateway = gateway(serve(happy_router(stub.clone())).await);

    gateway
        .assign_technologies_to_capacity(7, &[1, 2, 3])
        .await
        .unwrap();

    assert_eq!(stub.hits(), 1);
    assert_eq!(
        stub.bodies.lock().unwrap()[0],
        json!({"capacityId": 7, "technologiesIds": [1, 2, 3]})
    );
}

#[tokio::test]
async fn technologies_by_ids_are_decoded() {
    let stub = Stub::default();
    let gateway = gateway(serve(happy_router(stub.clone())).await);

    let found = gateway
        .get_technologies_by_capabilities_ids(&[1, 2])
        .await
        .unwrap();

    assert_eq!(stub.bodies.lock().unwrap()[0], json!([1, 2]));
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].technologies[1].name, "Go");
    assert!(found[1].technologies.is_empty());
}

#[tokio::test]
async fn sorted_page_sends_query_and_keeps_metadata() {
    let stub = Stub::default();
    let gateway = gateway(serve(happy_router(stub.clone())).await);

    let page = gateway
        .get_sort_technologies_by_capabilities(SortOrder::Descending, 1, 1)
        .await
        .unwrap();

    let query = stub.queries.lock().unwrap()[0].clone();
    assert_eq!(query["sort"], "DESC");
    assert_eq!(query["page"], "1");
    assert_eq!(query["size"], "1");
    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 5);
    assert_eq!(page.data[0].id, 3);
}

#[tokio::test]
async fn delete_sends_ids() {
    let stub = Stub::default();
    let gateway = gateway(serve(happy_router(stub.clone())).await);

    gateway
        .delete_technologies_by_capabilities_ids(&[4, 5])
        .await
        .unwrap();

    assert_eq!(stub.bodies.lock().unwrap()[0], json!([4, 5]));
}

#[tokio::test]
async fn client_error_is_not_found_and_not_retried() {
    let stub = Stub::default();
    let router = Router::new()
        .route(
            "/assign",
            post(|State(stub): State<Stub>, Json(body): Json<Value>| async move {
                stub.record(body);
                (StatusCode::NOT_FOUND, "technology 99 not found")
            }),
        )
        .with_state(stub.clone());
    let gateway = gateway(serve(router).await);

    let err = gateway
        .assign_technologies_to_capacity(1, &[99, 2, 3])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CapacityError::EntityNotFound(TechnicalMessage::TechnologiesNotFound)
    ));
    assert_eq!(stub.hits(), 1);
    assert_eq!(gateway.circuit_status(), CircuitStatus::Closed);
}

#[tokio::test]
async fn server_error_is_retried_then_technical() {
    let stub = Stub::default();
    let router = Router::new()
        .route(
            "/capabilities_ids",
            post(|State(stub): State<Stub>, Json(body): Json<Value>| async move {
                stub.record(body);
                StatusCode::INTERNAL_SERVER_ERROR
            }),
        )
        .with_state(stub.clone());
    let gateway = gateway(serve(router).await);

    let err = gateway
        .get_technologies_by_capabilities_ids(&[1])
        .await
        .unwrap_err();

    assert!(!err.is_business());
    assert_eq!(
        err.technical_message(),
        TechnicalMessage::ErrorTechnologyAdapter
    );
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn timeout_falls_back_to_internal_error() {
    let router = Router::new().route(
        "/assign",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK
        }),
    );
    let base_url = serve(router).await;
    let gateway = HttpTechnologiesGateway::new(TechnologyClientConfig {
        timeout: Duration::from_millis(50),
        retry: RetryConfig {
            max_attempts: 1,
            wait: Duration::from_millis(1),
        },
        ..TechnologyClientConfig::new(base_url)
    })
    .unwrap();

    let err = gateway
        .assign_technologies_to_capacity(1, &[1, 2, 3])
        .await
        .unwrap_err();

    assert_eq!(err.technical_message(), TechnicalMessage::InternalError);
}

#[tokio::test]
async fn open_circuit_stops_calling_the_service() {
    let stub = Stub::default();
    let router = Router::new()
        .route(
            "/capabilities",
            axum::routing::delete(|State(stub): State<Stub>, Json(body): Json<Value>| async move {
                stub.record(body);
                StatusCode::SERVICE_UNAVAILABLE
            }),
        )
        .with_state(stub.clone());
    let gateway = gateway(serve(router).await);

    for _ in 0..2 {
        let _ = gateway.delete_technologies_by_capabilities_ids(&[1]).await;
    }
    assert_eq!(gateway.circuit_status(), CircuitStatus::Open);
    let hits_when_opened = stub.hits();

    let err = gateway
        .delete_technologies_by_capabilities_ids(&[1])
        .await
        .unwrap_err();

    assert_eq!(err.technical_message(), TechnicalMessage::InternalError);
    assert_eq!(stub.hits(), hits_when_opened);
}
