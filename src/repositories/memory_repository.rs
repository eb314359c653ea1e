//! Almacén en memoria
//!
//! Implementa los tres repositorios sobre un único `Mutex`, de modo que
//! reservar (leer asientos, insertar, decrementar) es atómico igual que la
//! transacción de PostgreSQL. Se usa en tests y con `STORE_BACKEND=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BookingRepository, RouteRepository, ScheduleRepository};
use crate::models::booking::{Booking, BookingAction, NewBooking};
use crate::models::route::{Route, RouteStatus};
use crate::models::schedule::{Schedule, ScheduleStatus};
use crate::services::seat_allocation::allocate_seat;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Default)]
struct MemoryData {
    routes: HashMap<Uuid, Route>,
    schedules: HashMap<Uuid, Schedule>,
    /// Indexadas por número de reserva
    bookings: HashMap<String, Booking>,
}

#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<MemoryData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteRepository for InMemoryStore {
    async fn create(&self, route: &Route) -> AppResult<Route> {
        let mut data = self.data.lock().await;
        if data.routes.values().any(|r| r.route_number == route.route_number) {
            return Err(conflict_error("Route", "route_number", &route.route_number));
        }
        data.routes.insert(route.id, route.clone());
        Ok(route.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>> {
        Ok(self.data.lock().await.routes.get(&id).cloned())
    }

    async fn route_number_exists(&self, route_number: &str) -> AppResult<bool> {
        let data = self.data.lock().await;
        Ok(data.routes.values().any(|r| r.route_number == route_number))
    }

    async fn list(&self, status: Option<RouteStatus>) -> AppResult<Vec<Route>> {
        let data = self.data.lock().await;
        let mut routes: Vec<Route> = data
            .routes
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        routes.sort_by(|a, b| a.route_number.cmp(&b.route_number));
        Ok(routes)
    }

    async fn update_status(&self, id: Uuid, status: RouteStatus) -> AppResult<Option<Route>> {
        let mut data = self.data.lock().await;
        Ok(data.routes.get_mut(&id).map(|route| {
            route.status = status;
            route.updated_at = Utc::now();
            route.clone()
        }))
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryStore {
    async fn create(&self, schedule: &Schedule) -> AppResult<Schedule> {
        let mut data = self.data.lock().await;
        data.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Schedule>> {
        Ok(self.data.lock().await.schedules.get(&id).cloned())
    }

    async fn list_by_route(&self, route_id: Uuid) -> AppResult<Vec<Schedule>> {
        let data = self.data.lock().await;
        let mut schedules: Vec<Schedule> = data
            .schedules
            .values()
            .filter(|s| s.route_id == route_id)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.departure_time);
        Ok(schedules)
    }

    async fn update_status(&self, id: Uuid, status: ScheduleStatus) -> AppResult<Option<Schedule>> {
        let mut data = self.data.lock().await;
        Ok(data.schedules.get_mut(&id).map(|schedule| {
            schedule.status = status;
            schedule.updated_at = Utc::now();
            schedule.clone()
        }))
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn create_reserving_seat(&self, new_booking: NewBooking) -> AppResult<Booking> {
        let mut data = self.data.lock().await;

        if data.bookings.contains_key(&new_booking.booking_number) {
            return Err(conflict_error("Booking", "booking_number", &new_booking.booking_number));
        }

        let schedule = data
            .schedules
            .get(&new_booking.schedule_id)
            .ok_or_else(|| not_found_error("Schedule", &new_booking.schedule_id.to_string()))?;

        if !schedule.accepts_bookings() {
            return Err(AppError::Conflict(format!(
                "Schedule {} is not accepting bookings ({:?})",
                schedule.id, schedule.status
            )));
        }

        let taken: Vec<i32> = data
            .bookings
            .values()
            .filter(|b| b.schedule_id == schedule.id && b.status.holds_seat())
            .map(|b| b.seat_number)
            .collect();

        let seat = allocate_seat(
            schedule.total_seats,
            schedule.available_seats,
            &taken,
            new_booking.requested_seat,
        )?;

        let booking = new_booking.into_booking(seat);

        if let Some(schedule) = data.schedules.get_mut(&booking.schedule_id) {
            schedule.available_seats -= 1;
            schedule.updated_at = Utc::now();
        }
        data.bookings.insert(booking.booking_number.clone(), booking.clone());

        Ok(booking)
    }

    async fn find_by_number(&self, booking_number: &str) -> AppResult<Option<Booking>> {
        Ok(self.data.lock().await.bookings.get(booking_number).cloned())
    }

    async fn list_by_schedule(&self, schedule_id: Uuid) -> AppResult<Vec<Booking>> {
        let data = self.data.lock().await;
        let mut bookings: Vec<Booking> = data
            .bookings
            .values()
            .filter(|b| b.schedule_id == schedule_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.seat_number, b.created_at));
        Ok(bookings)
    }

    async fn apply_action(&self, booking_number: &str, action: BookingAction) -> AppResult<Booking> {
        let mut data = self.data.lock().await;

        let booking = data
            .bookings
            .get_mut(booking_number)
            .ok_or_else(|| not_found_error("Booking", booking_number))?;

        // Trabajar sobre una copia: si la transición falla no se toca nada
        let mut updated = booking.clone();
        let outcome = updated
            .apply(action)
            .map_err(|e| AppError::Conflict(e.to_string()))?;
        *booking = updated.clone();

        if outcome.seat_released {
            if let Some(schedule) = data.schedules.get_mut(&updated.schedule_id) {
                schedule.available_seats = (schedule.available_seats + 1).min(schedule.total_seats);
                schedule.updated_at = Utc::now();
            }
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{BookingStatus, PaymentMethod};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn schedule(seats: i32) -> Schedule {
        Schedule::new(
            Uuid::new_v4(),
            "BUS-01".to_string(),
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 20, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap(),
            seats,
            None,
        )
    }

    fn new_booking(schedule: &Schedule, number: &str) -> NewBooking {
        NewBooking {
            booking_number: number.to_string(),
            schedule_id: schedule.id,
            route_id: schedule.route_id,
            passenger_name: "Thoko Phiri".to_string(),
            passenger_email: "thoko@example.com".to_string(),
            passenger_phone: "+265888123456".to_string(),
            requested_seat: None,
            boarding_stop: "A".to_string(),
            alighting_stop: "B".to_string(),
            fare: Decimal::new(2500, 2),
            payment_method: PaymentMethod::Cash,
            status: BookingStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn test_booking_consumes_and_cancel_releases_seat() {
        let store = InMemoryStore::new();
        let s = ScheduleRepository::create(&store, &schedule(2)).await.unwrap();

        let first = store.create_reserving_seat(new_booking(&s, "BUS-1")).await.unwrap();
        assert_eq!(first.seat_number, 1);
        let after = ScheduleRepository::find_by_id(&store, s.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 1);

        store.apply_action("BUS-1", BookingAction::Cancel).await.unwrap();
        let after = ScheduleRepository::find_by_id(&store, s.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 2);

        // El asiento liberado vuelve a estar disponible
        let again = store.create_reserving_seat(new_booking(&s, "BUS-2")).await.unwrap();
        assert_eq!(again.seat_number, 1);
    }

    #[tokio::test]
    async fn test_sold_out_leaves_no_partial_state() {
        let store = InMemoryStore::new();
        let s = ScheduleRepository::create(&store, &schedule(1)).await.unwrap();

        store.create_reserving_seat(new_booking(&s, "BUS-1")).await.unwrap();
        let err = store.create_reserving_seat(new_booking(&s, "BUS-2")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert!(store.find_by_number("BUS-2").await.unwrap().is_none());
        let after = ScheduleRepository::find_by_id(&store, s.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 0);
    }

    #[tokio::test]
    async fn test_failed_transition_changes_nothing() {
        let store = InMemoryStore::new();
        let s = ScheduleRepository::create(&store, &schedule(3)).await.unwrap();
        store.create_reserving_seat(new_booking(&s, "BUS-1")).await.unwrap();
        store.apply_action("BUS-1", BookingAction::Complete).await.unwrap();

        let err = store.apply_action("BUS-1", BookingAction::Cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let booking = store.find_by_number("BUS-1").await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        let after = ScheduleRepository::find_by_id(&store, s.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 2);
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.apply_action("BUS-404", BookingAction::Cancel).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
