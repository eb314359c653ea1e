use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::schedule_controller::ScheduleController;
use crate::dto::schedule_dto::{CreateScheduleRequest, UpdateScheduleStatusRequest};
use crate::dto::ApiResponse;
use crate::models::booking::Booking;
use crate::models::schedule::Schedule;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_schedule_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_schedule))
        .route("/:id", get(get_schedule))
        .route("/:id/status", patch(update_schedule_status))
        .route("/:id/bookings", get(list_schedule_bookings))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Schedule>>), AppError> {
    let controller = ScheduleController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    let controller = ScheduleController::new(&state);
    let schedule = controller.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(schedule)))
}

async fn update_schedule_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScheduleStatusRequest>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    let controller = ScheduleController::new(&state);
    let response = controller.update_status(id, request.status).await?;
    Ok(Json(response))
}

async fn list_schedule_bookings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let controller = ScheduleController::new(&state);
    let bookings = controller.list_bookings(id).await?;
    Ok(Json(ApiResponse::success(bookings)))
}
