/// HTTP-level tests for the vehicle routes
/// Drives the router in-process with tower::ServiceExt::oneshot
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vehicle_portal_api::api::{handlers::AppState, router::build_router};
use vehicle_portal_api::domain::{models::Customer, vehicles::VehicleLookupService};
use vehicle_portal_api::memory_store::MemoryStore;

const TOKEN_A: &str = "token-customer-a";
const TOKEN_B: &str = "token-customer-b";

struct TestApp {
    store: Arc<MemoryStore>,
    router: Router,
    customer_a: Customer,
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let customer_a = store.add_customer("Customer A", TOKEN_A).unwrap();
    store.add_customer("Customer B", TOKEN_B).unwrap();

    let state = Arc::new(AppState {
        vehicles: VehicleLookupService::from_store(store.clone()),
        customers: store.clone(),
    });

    TestApp {
        store,
        router: build_router(state),
        customer_a,
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_then_found() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/vehicles/create",
        Some(TOKEN_A),
        Some(json!({"vehicle_number": " ka01ab1234 "})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);
    assert_eq!(body["message"], "New vehicle created");
    assert_eq!(body["vehicle"]["vehicleRegistrationNo"], "KA01AB1234");
    assert_eq!(
        body["vehicle"]["customer"],
        app.customer_a.id.to_string()
    );
    assert_eq!(body["drivers"], json!([]));
    assert_eq!(body["helpers"], json!([]));
    assert!(body["po_number"].is_null());
    assert_eq!(body["documents"], json!([]));

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/vehicles/create-or-get-vehicle-info",
        Some(TOKEN_B),
        Some(json!({"vehicle_number": "KA01AB1234"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert_eq!(body["message"], "Existing vehicle found");
    assert_eq!(
        body["vehicle"]["customer"],
        app.customer_a.id.to_string()
    );
}

#[tokio::test]
async fn test_create_requires_number() {
    let app = test_app();

    for payload in [json!({}), json!({"vehicle_number": "   "})] {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/vehicles/create",
            Some(TOKEN_A),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Vehicle number is required");
    }
    assert_eq!(app.store.vehicle_count().unwrap(), 0);
}

#[tokio::test]
async fn test_create_without_body() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/vehicles/create",
        Some(TOKEN_A),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Vehicle number is required");

    let (status, body) = send(&app.router, Method::POST, "/vehicles", Some(TOKEN_A), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "vehicleRegistrationNo is required");

    assert_eq!(app.store.vehicle_count().unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/vehicles/create",
        Some(TOKEN_A),
        Some(json!({"vehicle_number": 123})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/vehicles/create")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN_A))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"vehicle_number\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/vehicles",
        Some(TOKEN_A),
        Some(json!({"vehicleRegistrationNo": "AB12", "remark": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert_eq!(app.store.vehicle_count().unwrap(), 0);
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/vehicles/create",
        None,
        Some(json!({"vehicle_number": "AB12"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/vehicles/create",
        Some("not-a-real-token"),
        Some(json!({"vehicle_number": "AB12"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.vehicle_count().unwrap(), 0);
}

#[tokio::test]
async fn test_my_vehicles() {
    let app = test_app();

    for number in ["AA01", "AA02"] {
        send(
            &app.router,
            Method::POST,
            "/vehicles/create",
            Some(TOKEN_A),
            Some(json!({"vehicle_number": number})),
        )
        .await;
    }
    send(
        &app.router,
        Method::POST,
        "/vehicles/create",
        Some(TOKEN_B),
        Some(json!({"vehicle_number": "BB01"})),
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/vehicles/my-vehicles",
        Some(TOKEN_A),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["vehicles"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app.router, Method::GET, "/vehicles/my-vehicles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_vehicle_complete_data() {
    let app = test_app();
    send(
        &app.router,
        Method::POST,
        "/vehicles/create",
        Some(TOKEN_A),
        Some(json!({"vehicle_number": "GJ01XX0001"})),
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/vehicles/vehicle-complete-data?vehicle_reg_no=GJ01XX0001",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicle"]["vehicleRegistrationNo"], "GJ01XX0001");
    assert!(body.get("created").is_none());
    assert!(body.get("message").is_none());

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/vehicles/vehicle-complete-data",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/vehicles/vehicle-complete-data?vehicle_reg_no=UNKNOWN",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Vehicle not found");
}

#[tokio::test]
async fn test_standard_crud() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/vehicles",
        Some(TOKEN_A),
        Some(json!({"vehicleRegistrationNo": "pb10ff0001", "remark": "Tipper"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["vehicleRegistrationNo"], "PB10FF0001");

    let (status, body) = send(&app.router, Method::GET, "/vehicles/PB10FF0001", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remark"], "Tipper");

    let (status, body) = send(
        &app.router,
        Method::PATCH,
        "/vehicles/PB10FF0001",
        Some(TOKEN_A),
        Some(json!({"remark": "Tipper 10T"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remark"], "Tipper 10T");

    let (status, body) = send(&app.router, Method::GET, "/vehicles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app.router, Method::DELETE, "/vehicles/PB10FF0001", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app.router,
        Method::DELETE,
        "/vehicles/PB10FF0001",
        Some(TOKEN_A),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vehicle PB10FF0001 deleted successfully");

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        "/vehicles/PB10FF0001",
        Some(TOKEN_A),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trailing_slash_paths() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/vehicles/create-or-get-vehicle-info/",
        Some(TOKEN_A),
        Some(json!({"vehicle_number": "dl3cab0042"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["vehicle"]["vehicleRegistrationNo"], "DL3CAB0042");

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/vehicles/my-vehicles/",
        Some(TOKEN_A),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/vehicles/vehicle-complete-data/?vehicle_reg_no=DL3CAB0042",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicle"]["vehicleRegistrationNo"], "DL3CAB0042");

    let (status, body) = send(&app.router, Method::GET, "/vehicles/DL3CAB0042/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicleRegistrationNo"], "DL3CAB0042");

    let (status, body) = send(&app.router, Method::GET, "/vehicles/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_token_rejected_on_public_route() {
    let app = test_app();
    let (status, _) = send(
        &app.router,
        Method::GET,
        "/vehicles",
        Some("stale-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api-docs/openapi.json",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/vehicles/create"].is_object());
}
