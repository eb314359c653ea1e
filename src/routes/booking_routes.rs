use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::CreateBookingRequest;
use crate::dto::ApiResponse;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::models::booking::{Booking, BookingAction};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// El alta de reservas pasa por el rate limiter; lecturas y transiciones no.
pub fn create_booking_router(state: AppState) -> Router<AppState> {
    let create = Router::new()
        .route("/", post(create_booking))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware));

    Router::new()
        .merge(create)
        .route("/:booking_number", get(get_booking))
        .route("/:booking_number/confirm-payment", post(confirm_payment))
        .route("/:booking_number/complete", post(complete_booking))
        .route("/:booking_number/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    let controller = BookingController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_number): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(&state);
    let booking = controller.get_by_number(&booking_number).await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn confirm_payment(
    State(state): State<AppState>,
    Path(booking_number): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    transition(state, booking_number, BookingAction::ConfirmPayment).await
}

async fn complete_booking(
    State(state): State<AppState>,
    Path(booking_number): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    transition(state, booking_number, BookingAction::Complete).await
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_number): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    transition(state, booking_number, BookingAction::Cancel).await
}

async fn transition(
    state: AppState,
    booking_number: String,
    action: BookingAction,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.apply_action(&booking_number, action).await?;
    Ok(Json(response))
}
