use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::schedule_dto::CreateScheduleRequest;
use crate::dto::ApiResponse;
use crate::models::booking::Booking;
use crate::models::schedule::{Schedule, ScheduleStatus};
use crate::repositories::{BookingRepository, ScheduleRepository};
use crate::services::route_cache_service::RouteCacheService;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct ScheduleController {
    routes: RouteCacheService,
    schedules: Arc<dyn ScheduleRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl ScheduleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            routes: state.route_cache.clone(),
            schedules: state.schedules.clone(),
            bookings: state.bookings.clone(),
        }
    }

    pub async fn create(&self, request: CreateScheduleRequest) -> AppResult<ApiResponse<Schedule>> {
        request.validate()?;

        let route = self
            .routes
            .get(request.route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &request.route_id.to_string()))?;

        if !route.is_active() {
            return Err(AppError::Conflict(format!(
                "Route {} is {} and cannot receive schedules",
                route.route_number,
                route.status.as_str()
            )));
        }

        let schedule = Schedule::new(
            route.id,
            request.vehicle_id.trim().to_string(),
            request.service_date,
            request.departure_time,
            request.arrival_time,
            request.total_seats,
            request.fare,
        );
        let schedule = self.schedules.create(&schedule).await?;

        info!(
            "🗓️ Salida {} de la ruta {} el {} con {} asientos",
            schedule.id, route.route_number, schedule.service_date, schedule.total_seats
        );

        Ok(ApiResponse::success_with_message(
            schedule,
            "Salida programada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Schedule> {
        self.schedules
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &id.to_string()))
    }

    pub async fn update_status(&self, id: Uuid, status: ScheduleStatus) -> AppResult<ApiResponse<Schedule>> {
        let schedule = self
            .schedules
            .update_status(id, status)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &id.to_string()))?;

        info!("🔄 Salida {} ahora está {:?}", schedule.id, schedule.status);

        Ok(ApiResponse::success_with_message(
            schedule,
            "Estado de la salida actualizado".to_string(),
        ))
    }

    pub async fn list_bookings(&self, id: Uuid) -> AppResult<Vec<Booking>> {
        let schedule = self.get_by_id(id).await?;
        self.bookings.list_by_schedule(schedule.id).await
    }
}
