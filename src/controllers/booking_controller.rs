use tracing::info;

use crate::dto::booking_dto::CreateBookingRequest;
use crate::dto::ApiResponse;
use crate::models::booking::{Booking, BookingAction};
use crate::services::booking_service::BookingService;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub struct BookingController {
    service: BookingService,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.booking_service(),
        }
    }

    pub async fn create(&self, request: CreateBookingRequest) -> AppResult<ApiResponse<Booking>> {
        let booking = self.service.create_booking(request).await?;
        let message = format!("Reserva {} creada", booking.booking_number);
        Ok(ApiResponse::success_with_message(booking, message))
    }

    pub async fn get_by_number(&self, booking_number: &str) -> AppResult<Booking> {
        self.service.get_booking(booking_number).await
    }

    pub async fn apply_action(
        &self,
        booking_number: &str,
        action: BookingAction,
    ) -> AppResult<ApiResponse<Booking>> {
        let booking = self.service.apply_action(booking_number, action).await?;
        info!(
            "🎫 Reserva {}: {} -> {:?} (pago {:?})",
            booking.booking_number,
            action.as_str(),
            booking.status,
            booking.payment_status
        );

        let message = format!("Acción '{}' aplicada", action.as_str());
        Ok(ApiResponse::success_with_message(booking, message))
    }
}
