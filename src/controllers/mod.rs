//! Controladores
//!
//! Orquestan repositorios y servicios para cada recurso de la API.

pub mod booking_controller;
pub mod route_controller;
pub mod schedule_controller;
