//! Modelos de dominio: rutas, salidas y reservas

pub mod booking;
pub mod route;
pub mod schedule;
