use std::sync::Arc;

use chrono::NaiveDate;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::booking_dto::CreateBookingRequest;
use crate::models::booking::{Booking, BookingAction, NewBooking};
use crate::repositories::{BookingRepository, ScheduleRepository};
use crate::services::fare_calculator::quote_route;
use crate::services::route_cache_service::RouteCacheService;
use crate::utils::errors::{not_found_error, AppError, AppResult};

const BOOKING_NUMBER_PREFIX: &str = "BUS";
const BOOKING_NUMBER_SUFFIX_LEN: usize = 6;

/// Construcción de reservas: valida, tarifica en servidor y persiste
/// consumiendo un asiento en una sola operación atómica del repositorio.
#[derive(Clone)]
pub struct BookingService {
    routes: RouteCacheService,
    schedules: Arc<dyn ScheduleRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingService {
    pub fn new(
        routes: RouteCacheService,
        schedules: Arc<dyn ScheduleRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            routes,
            schedules,
            bookings,
        }
    }

    pub async fn create_booking(&self, request: CreateBookingRequest) -> AppResult<Booking> {
        request.validate()?;

        let schedule = self
            .schedules
            .find_by_id(request.schedule_id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &request.schedule_id.to_string()))?;

        if !schedule.accepts_bookings() {
            return Err(AppError::Conflict(format!(
                "Schedule {} is not accepting bookings ({:?})",
                schedule.id, schedule.status
            )));
        }
        if schedule.is_sold_out() {
            return Err(AppError::Conflict(format!("Schedule {} is sold out", schedule.id)));
        }

        let route = self
            .routes
            .get(schedule.route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &schedule.route_id.to_string()))?;

        if !route.is_active() {
            return Err(AppError::Conflict(format!(
                "Route {} is {}",
                route.route_number,
                route.status.as_str()
            )));
        }

        let boarding_stop = request.boarding_stop.trim().to_string();
        let alighting_stop = request.alighting_stop.trim().to_string();

        let quote = quote_route(&route, schedule.fare, &boarding_stop, &alighting_stop);
        if !quote.is_chargeable() {
            return Err(AppError::BadRequest(format!(
                "No fare can be charged from '{}' to '{}': {}",
                boarding_stop,
                alighting_stop,
                quote.basis.describe()
            )));
        }

        if let Some(client_fare) = request.fare {
            if client_fare != quote.amount {
                warn!(
                    "⚠️ Tarifa del cliente {} distinta de la calculada {} ({} -> {})",
                    client_fare, quote.amount, boarding_stop, alighting_stop
                );
                return Err(AppError::Conflict(format!(
                    "Fare changed: expected {}, received {}",
                    quote.amount, client_fare
                )));
            }
        }

        let new_booking = NewBooking {
            booking_number: generate_booking_number(schedule.service_date),
            schedule_id: schedule.id,
            route_id: route.id,
            passenger_name: request.passenger_name.trim().to_string(),
            passenger_email: request.passenger_email.trim().to_lowercase(),
            passenger_phone: request.passenger_phone.trim().to_string(),
            requested_seat: request.seat_number,
            boarding_stop,
            alighting_stop,
            fare: quote.amount,
            payment_method: request.payment_method,
            status: request.payment_method.initial_booking_status(),
        };

        let booking = self.bookings.create_reserving_seat(new_booking).await?;

        info!(
            "✅ Reserva {} ({:?}) {} -> {} por {} [{}]",
            booking.booking_number,
            booking.status,
            booking.boarding_stop,
            booking.alighting_stop,
            booking.fare,
            quote.basis.describe()
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_number: &str) -> AppResult<Booking> {
        self.bookings
            .find_by_number(booking_number)
            .await?
            .ok_or_else(|| not_found_error("Booking", booking_number))
    }

    pub async fn apply_action(&self, booking_number: &str, action: BookingAction) -> AppResult<Booking> {
        self.bookings.apply_action(booking_number, action).await
    }
}

/// `BUS-YYYYMMDD-XXXXXX` con la fecha de servicio y sufijo aleatorio
pub fn generate_booking_number(service_date: NaiveDate) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOOKING_NUMBER_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();

    format!(
        "{}-{}-{}",
        BOOKING_NUMBER_PREFIX,
        service_date.format("%Y%m%d"),
        suffix
    )
}
