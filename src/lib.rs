//! Shiteni Transit
//!
//! API de reservas de autobús: rutas con paradas y tramos tarifados,
//! salidas con asientos y reservas con tarifa calculada en servidor.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
