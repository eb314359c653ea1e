use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{map_unique_violation, BookingRepository};
use crate::models::booking::{Booking, BookingAction, NewBooking};
use crate::models::schedule::Schedule;
use crate::services::seat_allocation::allocate_seat;
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_reserving_seat(&self, new_booking: NewBooking) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        // Bloquear la salida hasta el commit: serializa reservas concurrentes
        let schedule = sqlx::query_as::<_, Schedule>(
            "SELECT * FROM schedules WHERE id = $1 FOR UPDATE",
        )
        .bind(new_booking.schedule_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found_error("Schedule", &new_booking.schedule_id.to_string()))?;

        if !schedule.accepts_bookings() {
            return Err(AppError::Conflict(format!(
                "Schedule {} is not accepting bookings ({:?})",
                schedule.id, schedule.status
            )));
        }

        let taken: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT seat_number FROM bookings
            WHERE schedule_id = $1 AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(schedule.id)
        .fetch_all(&mut *tx)
        .await?;

        let seat = allocate_seat(
            schedule.total_seats,
            schedule.available_seats,
            &taken,
            new_booking.requested_seat,
        )?;

        let booking = new_booking.into_booking(seat);
        let booking_number = booking.booking_number.clone();

        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, booking_number, schedule_id, route_id, passenger_name, passenger_email,
                passenger_phone, seat_number, boarding_stop, alighting_stop, fare,
                payment_method, payment_status, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_number)
        .bind(booking.schedule_id)
        .bind(booking.route_id)
        .bind(&booking.passenger_name)
        .bind(&booking.passenger_email)
        .bind(&booking.passenger_phone)
        .bind(booking.seat_number)
        .bind(&booking.boarding_stop)
        .bind(&booking.alighting_stop)
        .bind(booking.fare)
        .bind(booking.payment_method)
        .bind(booking.payment_status)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                format!("Booking {} collides with an existing booking number or seat", booking_number),
            )
        })?;

        let decremented = sqlx::query(
            r#"
            UPDATE schedules
            SET available_seats = available_seats - 1, updated_at = NOW()
            WHERE id = $1 AND available_seats > 0
            "#,
        )
        .bind(schedule.id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() != 1 {
            // El rollback lo hace el drop de la transacción
            return Err(AppError::Conflict(format!("Schedule {} is sold out", schedule.id)));
        }

        tx.commit().await?;

        info!(
            "🎫 Reserva {} creada: asiento {} en salida {}",
            created.booking_number, created.seat_number, created.schedule_id
        );
        Ok(created)
    }

    async fn find_by_number(&self, booking_number: &str) -> AppResult<Option<Booking>> {
        let result = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_number = $1")
            .bind(booking_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn list_by_schedule(&self, schedule_id: Uuid) -> AppResult<Vec<Booking>> {
        let result = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE schedule_id = $1 ORDER BY seat_number, created_at",
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(result)
    }

    async fn apply_action(&self, booking_number: &str, action: BookingAction) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let mut booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE booking_number = $1 FOR UPDATE",
        )
        .bind(booking_number)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found_error("Booking", booking_number))?;

        let outcome = booking
            .apply(action)
            .map_err(|e| AppError::Conflict(e.to_string()))?;

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, payment_status = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(booking.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        if outcome.seat_released {
            sqlx::query(
                r#"
                UPDATE schedules
                SET available_seats = LEAST(available_seats + 1, total_seats), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(updated.schedule_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "🔄 Reserva {} -> {:?} ({})",
            updated.booking_number,
            updated.status,
            action.as_str()
        );
        Ok(updated)
    }
}
