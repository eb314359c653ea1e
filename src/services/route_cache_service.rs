use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::redis_client::RedisClient;
use crate::cache::CacheOperations;
use crate::models::route::Route;
use crate::repositories::RouteRepository;
use crate::utils::errors::AppResult;

/// Lectura de rutas con cache Redis opcional delante del repositorio.
///
/// Un fallo de Redis nunca falla la petición: se registra y se lee del
/// repositorio.
#[derive(Clone)]
pub struct RouteCacheService {
    routes: Arc<dyn RouteRepository>,
    redis: Option<RedisClient>,
}

impl RouteCacheService {
    pub fn new(routes: Arc<dyn RouteRepository>, redis: Option<RedisClient>) -> Self {
        Self { routes, redis }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Route>> {
        if let Some(redis) = &self.redis {
            let key = redis.route_key(id);
            let cached: anyhow::Result<Option<Route>> = redis.get(&key).await;
            match cached {
                Ok(Some(route)) => return Ok(Some(route)),
                Ok(None) => {}
                Err(e) => warn!("⚠️ Ruta {} ilegible en cache: {}", id, e),
            }
        }

        let route = self.routes.find_by_id(id).await?;

        if let (Some(redis), Some(route)) = (&self.redis, &route) {
            let key = redis.route_key(id);
            if let Err(e) = redis.set(&key, route, redis.default_ttl()).await {
                warn!("⚠️ No se pudo cachear la ruta {}: {}", id, e);
            } else {
                debug!("💾 Ruta {} cacheada", id);
            }
        }

        Ok(route)
    }

    pub async fn invalidate(&self, id: Uuid) {
        if let Some(redis) = &self.redis {
            if let Err(e) = redis.delete(&redis.route_key(id)).await {
                warn!("⚠️ No se pudo invalidar la ruta {} en cache: {}", id, e);
            }
        }
    }
}
