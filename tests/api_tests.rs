use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shiteni_transit::config::EnvironmentConfig;
use shiteni_transit::routes::create_app;
use shiteni_transit::state::AppState;

fn create_test_app() -> Router {
    create_app(AppState::in_memory(EnvironmentConfig::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Ruta A-B-C-D con tramos 10/15/5 y tarifa plana 35
async fn create_route(app: &Router, route_number: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/routes",
        Some(json!({
            "name": "Lilongwe - Blantyre",
            "route_number": route_number,
            "stops": [
                { "name": "A", "departure_time": "06:00" },
                { "name": "B", "arrival_time": "07:10", "departure_time": "07:15" },
                { "name": "C", "latitude": -15.39, "longitude": 35.32 },
                { "name": "D", "arrival_time": "11:00" }
            ],
            "fare_segments": [
                { "from": "A", "to": "B", "amount": 10 },
                { "from": "B", "to": "C", "amount": 15 },
                { "from": "C", "to": "D", "amount": 5 }
            ],
            "fare": 35
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_schedule(app: &Router, route_id: &str, seats: i32) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/schedules",
        Some(json!({
            "route_id": route_id,
            "vehicle_id": "MW-BUS-07",
            "service_date": "2026-10-20",
            "departure_time": "2026-10-20T06:00:00Z",
            "arrival_time": "2026-10-20T11:00:00Z",
            "total_seats": seats
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["available_seats"], seats);
    body["data"]["id"].as_str().unwrap().to_string()
}

fn booking_body(schedule_id: &str, from: &str, to: &str, method: &str) -> Value {
    json!({
        "schedule_id": schedule_id,
        "passenger_name": "Mphatso Kachale",
        "passenger_email": "mphatso@example.com",
        "passenger_phone": "+265 991 000 111",
        "boarding_stop": from,
        "alighting_stop": to,
        "payment_method": method
    })
}

fn amount(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_fare_quotes() {
    let app = create_test_app();
    let route_id = create_route(&app, "R-100").await;

    let (status, body) = send(&app, "GET", &format!("/api/routes/{}/fare?from=A&to=D", route_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["data"]["amount"]), "30");
    assert_eq!(body["data"]["basis"]["kind"], "adjacent_segments");
    assert_eq!(body["data"]["chargeable"], true);

    let (_, body) = send(&app, "GET", &format!("/api/routes/{}/fare?from=B&to=C", route_id), None).await;
    assert_eq!(amount(&body["data"]["amount"]), "15");
    assert_eq!(body["data"]["basis"]["kind"], "direct_segment");

    let (status, body) = send(&app, "GET", &format!("/api/routes/{}/fare?from=D&to=A", route_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["data"]["amount"]), "0");
    assert_eq!(body["data"]["basis"]["kind"], "reverse_direction");
    assert_eq!(body["data"]["chargeable"], false);

    let (_, body) = send(&app, "GET", &format!("/api/routes/{}/fare?from=A&to=Zomba", route_id), None).await;
    assert_eq!(amount(&body["data"]["amount"]), "0");
    assert_eq!(body["data"]["basis"]["kind"], "unknown_stop");
}

#[tokio::test]
async fn test_route_validation_and_conflict() {
    let app = create_test_app();
    create_route(&app, "R-200").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/routes",
        Some(json!({
            "name": "Duplicada",
            "route_number": "R-200",
            "stops": [{ "name": "A" }, { "name": "B" }],
            "fare": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        "POST",
        "/api/routes",
        Some(json!({
            "name": "Una parada",
            "route_number": "R-201",
            "stops": [{ "name": "A" }],
            "fare": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        "POST",
        "/api/routes",
        Some(json!({
            "name": "Tramo ajeno",
            "route_number": "R-202",
            "stops": [{ "name": "A" }, { "name": "B" }],
            "fare_segments": [{ "from": "A", "to": "Zomba", "amount": 4 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/routes", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_route_name_and_number_are_rejected() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/routes",
        Some(json!({
            "name": "   ",
            "route_number": "   ",
            "stops": [{ "name": "A" }, { "name": "B" }],
            "fare": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["name"].is_array());
    assert!(body["details"]["route_number"].is_array());

    let (status, _) = send(
        &app,
        "POST",
        "/api/routes",
        Some(json!({
            "name": "Lilongwe - Salima",
            "route_number": "R-210",
            "stops": [{ "name": "A" }, { "name": "  " }],
            "fare": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/routes", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let app = create_test_app();
    let route_id = create_route(&app, "R-300").await;
    let schedule_id = create_schedule(&app, &route_id, 10).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&schedule_id, "A", "D", "mobile_money")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let booking = &body["data"];
    assert_eq!(amount(&booking["fare"]), "30");
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["payment_status"], "pending");
    let number = booking["booking_number"].as_str().unwrap().to_string();
    assert!(number.starts_with("BUS-20261020-"));

    let (status, body) = send(&app, "GET", &format!("/api/bookings/{}", number), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["data"]["fare"]), "30");

    let (_, body) = send(&app, "GET", &format!("/api/schedules/{}", schedule_id), None).await;
    assert_eq!(body["data"]["available_seats"], 9);

    let (status, body) = send(&app, "POST", &format!("/api/bookings/{}/confirm-payment", number), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");
    assert_eq!(body["data"]["payment_status"], "paid");

    let (status, body) = send(&app, "POST", &format!("/api/bookings/{}/cancel", number), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["payment_status"], "refunded");

    let (_, body) = send(&app, "GET", &format!("/api/schedules/{}", schedule_id), None).await;
    assert_eq!(body["data"]["available_seats"], 10);

    let (status, body) = send(&app, "POST", &format!("/api/bookings/{}/complete", number), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_cash_booking_is_confirmed_and_listed() {
    let app = create_test_app();
    let route_id = create_route(&app, "R-400").await;
    let schedule_id = create_schedule(&app, &route_id, 4).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&schedule_id, "B", "D", "cash")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "confirmed");
    assert_eq!(amount(&body["data"]["fare"]), "20");

    let (_, body) = send(&app, "GET", &format!("/api/schedules/{}/bookings", schedule_id), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", &format!("/api/routes/{}/schedules", route_id), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_booking_rejections_do_not_consume_seats() {
    let app = create_test_app();
    let route_id = create_route(&app, "R-500").await;
    let schedule_id = create_schedule(&app, &route_id, 2).await;

    // Sentido inverso
    let (status, _) = send(&app, "POST", "/api/bookings", Some(booking_body(&schedule_id, "D", "A", "cash"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Parada desconocida
    let (status, _) = send(&app, "POST", "/api/bookings", Some(booking_body(&schedule_id, "A", "Zomba", "cash"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Campos ausentes
    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(json!({ "schedule_id": schedule_id, "payment_method": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Tarifa del cliente desactualizada
    let mut stale = booking_body(&schedule_id, "A", "C", "card");
    stale["fare"] = json!("20");
    let (status, _) = send(&app, "POST", "/api/bookings", Some(stale)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Salida inexistente
    let (status, _) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body("00000000-0000-0000-0000-000000000000", "A", "B", "cash")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", &format!("/api/schedules/{}", schedule_id), None).await;
    assert_eq!(body["data"]["available_seats"], 2);
}

#[tokio::test]
async fn test_concurrent_last_seat() {
    let app = create_test_app();
    let route_id = create_route(&app, "R-600").await;
    let schedule_id = create_schedule(&app, &route_id, 1).await;

    let attempts = (0..2).map(|_| {
        let app = app.clone();
        let body = booking_body(&schedule_id, "A", "D", "cash");
        tokio::spawn(async move { send(&app, "POST", "/api/bookings", Some(body)).await.0 })
    });
    let statuses: Vec<StatusCode> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 1);

    let (_, body) = send(&app, "GET", &format!("/api/schedules/{}", schedule_id), None).await;
    assert_eq!(body["data"]["available_seats"], 0);
}

#[tokio::test]
async fn test_inactive_route_rejects_schedules_and_bookings() {
    let app = create_test_app();
    let route_id = create_route(&app, "R-700").await;
    let schedule_id = create_schedule(&app, &route_id, 5).await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/routes/{}/status", route_id),
        Some(json!({ "status": "maintenance" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "maintenance");

    let (status, _) = send(&app, "POST", "/api/bookings", Some(booking_body(&schedule_id, "A", "B", "cash"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/schedules",
        Some(json!({
            "route_id": route_id,
            "vehicle_id": "MW-BUS-08",
            "service_date": "2026-10-21",
            "departure_time": "2026-10-21T06:00:00Z",
            "arrival_time": "2026-10-21T11:00:00Z",
            "total_seats": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_schedule_fare_override_in_quote() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/routes",
        Some(json!({
            "name": "Sin tramos",
            "route_number": "R-800",
            "stops": [{ "name": "A" }, { "name": "B" }, { "name": "C" }],
            "fare": 12
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["unpriced_pairs"].as_array().unwrap().len(), 2);
    let route_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/schedules",
        Some(json!({
            "route_id": route_id,
            "vehicle_id": "MW-BUS-09",
            "service_date": "2026-10-22",
            "departure_time": "2026-10-22T06:00:00Z",
            "arrival_time": "2026-10-22T09:00:00Z",
            "total_seats": 20,
            "fare": 18
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, "GET", &format!("/api/routes/{}/fare?from=A&to=C", route_id), None).await;
    assert_eq!(amount(&body["data"]["amount"]), "12");
    assert_eq!(body["data"]["basis"]["kind"], "flat_fare");
    assert_eq!(body["data"]["degraded"], true);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/routes/{}/fare?from=A&to=C&schedule_id={}", route_id, schedule_id),
        None,
    )
    .await;
    assert_eq!(amount(&body["data"]["amount"]), "18");
}

#[tokio::test]
async fn test_schedule_validation() {
    let app = create_test_app();
    let route_id = create_route(&app, "R-900").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/schedules",
        Some(json!({
            "route_id": route_id,
            "vehicle_id": "MW-BUS-10",
            "service_date": "2026-10-20",
            "departure_time": "2026-10-20T11:00:00Z",
            "arrival_time": "2026-10-20T06:00:00Z",
            "total_seats": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, "GET", "/api/schedules/00000000-0000-0000-0000-000000000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// POST /api/bookings desde un socket concreto, opcionalmente con x-forwarded-for
async fn post_booking_from(app: &Router, peer: [u8; 4], forwarded_for: Option<&str>) -> StatusCode {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .extension(ConnectInfo(SocketAddr::from((peer, 40000))));
    if let Some(value) = forwarded_for {
        builder = builder.header("x-forwarded-for", value);
    }
    let body = booking_body("00000000-0000-0000-0000-000000000000", "A", "B", "cash");
    let request = builder.body(Body::from(body.to_string())).unwrap();

    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let app = create_app(AppState::in_memory(EnvironmentConfig {
        rate_limit_requests: 2,
        ..EnvironmentConfig::default()
    }));

    assert_eq!(post_booking_from(&app, [10, 0, 0, 1], None).await, StatusCode::NOT_FOUND);
    assert_eq!(post_booking_from(&app, [10, 0, 0, 1], None).await, StatusCode::NOT_FOUND);
    assert_eq!(
        post_booking_from(&app, [10, 0, 0, 1], None).await,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Otro cliente directo conserva su propia cuota
    assert_eq!(post_booking_from(&app, [10, 0, 0, 2], None).await, StatusCode::NOT_FOUND);

    // Sin proxy de confianza, rotar x-forwarded-for no evita el límite
    for i in 0..3 {
        let forwarded = format!("1.2.3.{}", i);
        assert_eq!(
            post_booking_from(&app, [10, 0, 0, 1], Some(&forwarded)).await,
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}

#[tokio::test]
async fn test_rate_limit_behind_trusted_proxy() {
    let app = create_app(AppState::in_memory(EnvironmentConfig {
        rate_limit_requests: 1,
        trust_proxy: true,
        ..EnvironmentConfig::default()
    }));

    let proxy = [172, 16, 0, 1];
    assert_eq!(post_booking_from(&app, proxy, Some("41.70.1.9")).await, StatusCode::NOT_FOUND);
    assert_eq!(
        post_booking_from(&app, proxy, Some("41.70.1.9")).await,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(post_booking_from(&app, proxy, Some("41.70.1.10")).await, StatusCode::NOT_FOUND);
}
