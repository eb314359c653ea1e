use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::PaymentMethod;
use crate::utils::validation::{validate_not_empty, validate_phone};

// Request para crear una reserva
//
// Los campos de texto usan `default` para que un campo ausente llegue como
// error de validación (400) y no como rechazo de deserialización.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub schedule_id: Uuid,

    #[serde(default)]
    #[validate(length(min = 2, max = 120), custom = "validate_not_empty")]
    pub passenger_name: String,

    #[serde(default)]
    #[validate(email)]
    pub passenger_email: String,

    #[serde(default)]
    #[validate(custom = "validate_phone")]
    pub passenger_phone: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub boarding_stop: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub alighting_stop: String,

    /// Tarifa mostrada al cliente; si no coincide con la calculada se rechaza
    pub fare: Option<Decimal>,

    pub payment_method: PaymentMethod,

    #[validate(range(min = 1))]
    pub seat_number: Option<i32>,
}
