//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los repositorios se inyectan como traits
//! para poder servir desde PostgreSQL o desde memoria.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::redis_client::RedisClient;
use crate::config::environment::EnvironmentConfig;
use crate::middleware::rate_limit::RateLimitState;
use crate::repositories::{
    BookingRepository, InMemoryStore, PgBookingRepository, PgRouteRepository,
    PgScheduleRepository, RouteRepository, ScheduleRepository,
};
use crate::services::{BookingService, RouteCacheService};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub routes: Arc<dyn RouteRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub route_cache: RouteCacheService,
    pub rate_limit: RateLimitState,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        routes: Arc<dyn RouteRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        bookings: Arc<dyn BookingRepository>,
        redis: Option<RedisClient>,
    ) -> Self {
        Self {
            route_cache: RouteCacheService::new(routes.clone(), redis),
            rate_limit: RateLimitState::new(&config),
            config,
            routes,
            schedules,
            bookings,
        }
    }

    /// Estado respaldado por PostgreSQL
    pub fn with_postgres(pool: PgPool, config: EnvironmentConfig, redis: Option<RedisClient>) -> Self {
        Self::new(
            config,
            Arc::new(PgRouteRepository::new(pool.clone())),
            Arc::new(PgScheduleRepository::new(pool.clone())),
            Arc::new(PgBookingRepository::new(pool)),
            redis,
        )
    }

    /// Estado respaldado por un almacén en memoria (tests y desarrollo local)
    pub fn in_memory(config: EnvironmentConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(config, store.clone(), store.clone(), store, None)
    }

    pub fn booking_service(&self) -> BookingService {
        BookingService::new(
            self.route_cache.clone(),
            self.schedules.clone(),
            self.bookings.clone(),
        )
    }
}
