//! Asignación de asientos
//!
//! Elige el asiento de una nueva reserva a partir de los asientos ya
//! ocupados por reservas vivas de la misma salida. Ambos repositorios lo
//! llaman con la salida bloqueada.

use std::collections::HashSet;

use thiserror::Error;

use crate::utils::errors::AppError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeatAllocationError {
    #[error("schedule is sold out")]
    SoldOut,

    #[error("seat {seat} does not exist (seats 1-{total_seats})")]
    OutOfRange { seat: i32, total_seats: i32 },

    #[error("seat {0} is already taken")]
    Taken(i32),
}

impl From<SeatAllocationError> for AppError {
    fn from(err: SeatAllocationError) -> Self {
        match err {
            SeatAllocationError::OutOfRange { .. } => AppError::BadRequest(err.to_string()),
            SeatAllocationError::SoldOut | SeatAllocationError::Taken(_) => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

/// Devuelve el asiento pedido si está libre o, sin preferencia, el de
/// número más bajo que quede libre.
pub fn allocate_seat(
    total_seats: i32,
    available_seats: i32,
    taken: &[i32],
    requested: Option<i32>,
) -> Result<i32, SeatAllocationError> {
    if available_seats <= 0 {
        return Err(SeatAllocationError::SoldOut);
    }

    let taken: HashSet<i32> = taken.iter().copied().collect();

    match requested {
        Some(seat) if seat < 1 || seat > total_seats => {
            Err(SeatAllocationError::OutOfRange { seat, total_seats })
        }
        Some(seat) if taken.contains(&seat) => Err(SeatAllocationError::Taken(seat)),
        Some(seat) => Ok(seat),
        None => (1..=total_seats)
            .find(|seat| !taken.contains(seat))
            .ok_or(SeatAllocationError::SoldOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_free_seat() {
        assert_eq!(allocate_seat(4, 4, &[], None), Ok(1));
        assert_eq!(allocate_seat(4, 2, &[1, 3], None), Ok(2));
        assert_eq!(allocate_seat(4, 1, &[1, 2, 3], None), Ok(4));
    }

    #[test]
    fn test_requested_seat() {
        assert_eq!(allocate_seat(4, 3, &[1], Some(3)), Ok(3));
        assert_eq!(allocate_seat(4, 3, &[1], Some(1)), Err(SeatAllocationError::Taken(1)));
        assert_eq!(
            allocate_seat(4, 3, &[1], Some(5)),
            Err(SeatAllocationError::OutOfRange { seat: 5, total_seats: 4 })
        );
    }

    #[test]
    fn test_sold_out() {
        assert_eq!(allocate_seat(2, 0, &[1, 2], None), Err(SeatAllocationError::SoldOut));
        assert_eq!(allocate_seat(2, 0, &[], Some(1)), Err(SeatAllocationError::SoldOut));
    }

    #[test]
    fn test_error_mapping() {
        let err: AppError = SeatAllocationError::SoldOut.into();
        assert_eq!(err.code(), "CONFLICT");
        let err: AppError = SeatAllocationError::OutOfRange { seat: 0, total_seats: 2 }.into();
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
