use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::dto::route_dto::{
    CreateRouteRequest, FareQuery, FareQuoteResponse, RouteFilters, RouteResponse,
    UpdateRouteStatusRequest,
};
use crate::dto::ApiResponse;
use crate::models::schedule::Schedule;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).post(create_route))
        .route("/:id", get(get_route))
        .route("/:id/status", patch(update_route_status))
        .route("/:id/fare", get(quote_fare))
        .route("/:id/schedules", get(list_route_schedules))
}

async fn create_route(
    State(state): State<AppState>,
    Json(request): Json<CreateRouteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RouteResponse>>), AppError> {
    let controller = RouteController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_routes(
    State(state): State<AppState>,
    Query(filters): Query<RouteFilters>,
) -> Result<Json<ApiResponse<Vec<RouteResponse>>>, AppError> {
    let controller = RouteController::new(&state);
    let routes = controller.list(filters.status).await?;
    Ok(Json(ApiResponse::success(routes)))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(&state);
    let route = controller.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(route)))
}

async fn update_route_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRouteStatusRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.update_status(id, request.status).await?;
    Ok(Json(response))
}

async fn quote_fare(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FareQuery>,
) -> Result<Json<ApiResponse<FareQuoteResponse>>, AppError> {
    let controller = RouteController::new(&state);
    let quote = controller.quote(id, query).await?;
    Ok(Json(ApiResponse::success(quote)))
}

async fn list_route_schedules(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Schedule>>>, AppError> {
    let controller = RouteController::new(&state);
    let schedules = controller.list_schedules(id).await?;
    Ok(Json(ApiResponse::success(schedules)))
}
