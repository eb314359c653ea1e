//! Modelo de Booking
//!
//! Reserva de un pasajero sobre una salida, entre una parada de subida y
//! una de bajada. Incluye la máquina de estados de la reserva:
//!
//! ```text
//! pending ──> confirmed ──> completed
//!    │            │
//!    └────────────┴──> cancelled
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Las reservas vivas ocupan asiento
    pub fn holds_seat(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// Método de pago - mapea al ENUM payment_method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Pago en efectivo al subir al autobús
    Cash,
    MobileMoney,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn is_pay_on_boarding(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    /// Estado inicial de una reserva pagada con este método
    pub fn initial_booking_status(&self) -> BookingStatus {
        if self.is_pay_on_boarding() {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        }
    }
}

/// Estado del pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub schedule_id: Uuid,
    pub route_id: Uuid,
    pub passenger_name: String,
    pub passenger_email: String,
    pub passenger_phone: String,
    pub seat_number: i32,
    pub boarding_stop: String,
    pub alighting_stop: String,
    pub fare: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reserva lista para persistir; el asiento lo asigna el repositorio
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_number: String,
    pub schedule_id: Uuid,
    pub route_id: Uuid,
    pub passenger_name: String,
    pub passenger_email: String,
    pub passenger_phone: String,
    pub requested_seat: Option<i32>,
    pub boarding_stop: String,
    pub alighting_stop: String,
    pub fare: Decimal,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
}

impl NewBooking {
    pub fn into_booking(self, seat_number: i32) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            booking_number: self.booking_number,
            schedule_id: self.schedule_id,
            route_id: self.route_id,
            passenger_name: self.passenger_name,
            passenger_email: self.passenger_email,
            passenger_phone: self.passenger_phone,
            seat_number,
            boarding_stop: self.boarding_stop,
            alighting_stop: self.alighting_stop,
            fare: self.fare,
            payment_method: self.payment_method,
            payment_status: PaymentStatus::Pending,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Disparadores externos de la máquina de estados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    ConfirmPayment,
    Complete,
    Cancel,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::ConfirmPayment => "confirm-payment",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {action} a booking in status {from:?}")]
pub struct TransitionError {
    pub action: &'static str,
    pub from: BookingStatus,
}

/// Resultado de aplicar una acción: indica si se liberó el asiento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub seat_released: bool,
}

impl Booking {
    /// Aplica una acción sobre la reserva respetando la máquina de estados.
    ///
    /// No toca la capacidad de la salida: el llamador debe devolver el
    /// asiento cuando `seat_released` es `true`, dentro de la misma
    /// transacción.
    pub fn apply(&mut self, action: BookingAction) -> Result<TransitionOutcome, TransitionError> {
        let err = TransitionError {
            action: action.as_str(),
            from: self.status,
        };

        let seat_released = match (action, self.status) {
            (BookingAction::ConfirmPayment, BookingStatus::Pending) => {
                self.status = BookingStatus::Confirmed;
                self.payment_status = PaymentStatus::Paid;
                false
            }
            (BookingAction::Complete, BookingStatus::Confirmed) => {
                self.status = BookingStatus::Completed;
                false
            }
            (BookingAction::Cancel, BookingStatus::Pending | BookingStatus::Confirmed) => {
                self.status = BookingStatus::Cancelled;
                if self.payment_status == PaymentStatus::Paid {
                    self.payment_status = PaymentStatus::Refunded;
                }
                true
            }
            _ => return Err(err),
        };

        self.updated_at = Utc::now();
        Ok(TransitionOutcome { seat_released })
    }
}
