//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: cálculo de
//! tarifas, asignación de asientos y construcción de reservas.

pub mod booking_service;
pub mod fare_calculator;
pub mod route_cache_service;
pub mod seat_allocation;

pub use booking_service::BookingService;
pub use route_cache_service::RouteCacheService;
