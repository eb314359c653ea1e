use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::schedule::ScheduleStatus;
use crate::utils::validation::{validate_amount, validate_not_empty};

// Request para programar una salida de una ruta
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule_times"))]
pub struct CreateScheduleRequest {
    pub route_id: Uuid,

    #[validate(length(min = 1, max = 50), custom = "validate_not_empty")]
    pub vehicle_id: String,

    pub service_date: NaiveDate,

    pub departure_time: DateTime<Utc>,

    pub arrival_time: DateTime<Utc>,

    #[validate(range(min = 1, max = 500))]
    pub total_seats: i32,

    /// Tarifa plana propia de esta salida
    #[validate(custom = "validate_amount")]
    pub fare: Option<Decimal>,
}

fn validate_schedule_times(request: &CreateScheduleRequest) -> Result<(), ValidationError> {
    if request.arrival_time <= request.departure_time {
        let mut error = ValidationError::new("arrival_before_departure");
        error.add_param("departure_time".into(), &request.departure_time.to_rfc3339());
        error.add_param("arrival_time".into(), &request.arrival_time.to_rfc3339());
        return Err(error);
    }
    Ok(())
}

// Request para cambiar el estado de una salida
#[derive(Debug, Deserialize)]
pub struct UpdateScheduleStatusRequest {
    pub status: ScheduleStatus,
}
