//! Modelo de Schedule
//!
//! Una salida concreta (fecha + hora + vehículo) de una ruta, con su
//! capacidad de asientos.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la salida - mapea al ENUM schedule_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "schedule_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Boarding,
    Departed,
    Arrived,
    Cancelled,
}

/// Schedule principal - mapea exactamente a la tabla schedules
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Schedule {
    pub id: Uuid,
    pub route_id: Uuid,
    pub vehicle_id: String,
    pub service_date: NaiveDate,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub total_seats: i32,
    pub available_seats: i32,
    /// Tarifa plana propia de la salida; tiene prioridad sobre la de la ruta
    pub fare: Option<Decimal>,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        route_id: Uuid,
        vehicle_id: String,
        service_date: NaiveDate,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
        total_seats: i32,
        fare: Option<Decimal>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            route_id,
            vehicle_id,
            service_date,
            departure_time,
            arrival_time,
            total_seats,
            available_seats: total_seats,
            fare,
            status: ScheduleStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }

    /// Solo se venden billetes antes de la salida
    pub fn accepts_bookings(&self) -> bool {
        matches!(self.status, ScheduleStatus::Scheduled | ScheduleStatus::Boarding)
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule() -> Schedule {
        Schedule::new(
            Uuid::new_v4(),
            "MW-BT-1234".to_string(),
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 20, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 20, 11, 30, 0).unwrap(),
            2,
            None,
        )
    }

    #[test]
    fn test_new_schedule_starts_with_full_capacity() {
        let s = schedule();
        assert_eq!(s.available_seats, 2);
        assert_eq!(s.status, ScheduleStatus::Scheduled);
        assert!(s.accepts_bookings());
        assert!(!s.is_sold_out());
    }

    #[test]
    fn test_departed_schedule_rejects_bookings() {
        let mut s = schedule();
        s.status = ScheduleStatus::Departed;
        assert!(!s.accepts_bookings());
        s.status = ScheduleStatus::Boarding;
        assert!(s.accepts_bookings());
    }
}
