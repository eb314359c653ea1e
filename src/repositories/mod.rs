//! Repositorios
//!
//! Acceso a datos detrás de traits async, inyectados en `AppState`.
//! Hay una implementación PostgreSQL (sqlx) y otra en memoria para tests
//! y desarrollo local.

pub mod booking_repository;
pub mod memory_repository;
pub mod route_repository;
pub mod schedule_repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingAction, NewBooking};
use crate::models::route::{Route, RouteStatus};
use crate::models::schedule::{Schedule, ScheduleStatus};
use crate::utils::errors::{AppError, AppResult};

pub use booking_repository::PgBookingRepository;
pub use memory_repository::InMemoryStore;
pub use route_repository::PgRouteRepository;
pub use schedule_repository::PgScheduleRepository;

#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn create(&self, route: &Route) -> AppResult<Route>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>>;
    async fn route_number_exists(&self, route_number: &str) -> AppResult<bool>;
    async fn list(&self, status: Option<RouteStatus>) -> AppResult<Vec<Route>>;
    async fn update_status(&self, id: Uuid, status: RouteStatus) -> AppResult<Option<Route>>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, schedule: &Schedule) -> AppResult<Schedule>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Schedule>>;
    async fn list_by_route(&self, route_id: Uuid) -> AppResult<Vec<Schedule>>;
    async fn update_status(&self, id: Uuid, status: ScheduleStatus) -> AppResult<Option<Schedule>>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserta la reserva y consume un asiento de la salida de forma atómica.
    ///
    /// O se producen los dos efectos o ninguno. Salida agotada o asiento
    /// ocupado devuelven `AppError::Conflict`.
    async fn create_reserving_seat(&self, booking: NewBooking) -> AppResult<Booking>;

    async fn find_by_number(&self, booking_number: &str) -> AppResult<Option<Booking>>;

    async fn list_by_schedule(&self, schedule_id: Uuid) -> AppResult<Vec<Booking>>;

    /// Aplica una transición de estado; si libera el asiento lo devuelve a la
    /// salida en la misma operación atómica.
    async fn apply_action(&self, booking_number: &str, action: BookingAction) -> AppResult<Booking>;
}

/// Convierte una violación de unicidad de PostgreSQL (23505) en `Conflict`
pub(crate) fn map_unique_violation(err: sqlx::Error, message: impl Into<String>) -> AppError {
    let is_unique_violation = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false);

    if is_unique_violation {
        AppError::Conflict(message.into())
    } else {
        AppError::Database(err)
    }
}
