//! DTOs de la API
//!
//! Requests validados con `validator` y responses serializadas con serde.

pub mod booking_dto;
pub mod route_dto;
pub mod schedule_dto;

use serde::Serialize;

// Response genérica
#[derive(Debug, Serialize, serde::Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}
