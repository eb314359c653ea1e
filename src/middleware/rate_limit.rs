//! Middleware de Rate Limiting
//!
//! Este módulo maneja la limitación de velocidad de requests
//! para prevenir abuso de la creación de reservas.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::EnvironmentConfig;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Estructura para almacenar información de rate limiting por IP
#[derive(Debug, Clone)]
struct RateLimitInfo {
    requests: u32,
    window_start: Instant,
}

/// Estado global del rate limiting
#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
    max_requests: u32,
    window_duration: Duration,
    trust_proxy: bool,
}

impl RateLimitState {
    /// Crear nuevo estado de rate limiting
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self::with_limits(config.rate_limit_requests, Duration::from_secs(config.rate_limit_window))
            .trusting_proxy(config.trust_proxy)
    }

    pub fn with_limits(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window_duration,
            trust_proxy: false,
        }
    }

    /// Aceptar `x-forwarded-for` como origen de la IP del cliente
    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// IP del cliente: la del socket, o el primer salto de `x-forwarded-for`
    /// cuando hay un proxy de confianza delante
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let forwarded = if self.trust_proxy {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.split(',').next())
                .map(|ip| ip.trim())
                .filter(|ip| !ip.is_empty())
        } else {
            None
        };

        match (forwarded, peer) {
            (Some(ip), _) => ip.to_string(),
            (None, Some(addr)) => addr.ip().to_string(),
            (None, None) => "unknown".to_string(),
        }
    }

    /// Verificar si una IP ha excedido el límite
    pub async fn check_rate_limit(&self, ip: &str) -> Result<(), RateLimitError> {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        // Limpiar entradas expiradas
        requests.retain(|_, info| now.duration_since(info.window_start) < self.window_duration);

        // Obtener o crear información de rate limiting para esta IP
        let info = requests.entry(ip.to_string()).or_insert(RateLimitInfo {
            requests: 0,
            window_start: now,
        });

        // Verificar si se ha excedido el límite
        if info.requests >= self.max_requests {
            return Err(RateLimitError::LimitExceeded);
        }

        // Incrementar contador de requests
        info.requests += 1;
        Ok(())
    }
}

/// Errores de rate limiting
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Rate limit exceeded")]
    LimitExceeded,
}

/// Middleware de rate limiting
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // El servidor se sirve con `into_make_service_with_connect_info`
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = state.rate_limit.client_ip(request.headers(), peer);

    if let Err(RateLimitError::LimitExceeded) = state.rate_limit.check_rate_limit(&ip).await {
        return AppError::RateLimitExceeded.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_ip() {
        let state = RateLimitState::with_limits(2, Duration::from_secs(60));
        assert!(state.check_rate_limit("10.0.0.1").await.is_ok());
        assert!(state.check_rate_limit("10.0.0.1").await.is_ok());
        assert_eq!(
            state.check_rate_limit("10.0.0.1").await,
            Err(RateLimitError::LimitExceeded)
        );
        assert!(state.check_rate_limit("10.0.0.2").await.is_ok());
    }

    #[tokio::test]
    async fn test_window_expires() {
        let state = RateLimitState::with_limits(1, Duration::from_millis(20));
        assert!(state.check_rate_limit("10.0.0.1").await.is_ok());
        assert!(state.check_rate_limit("10.0.0.1").await.is_err());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(state.check_rate_limit("10.0.0.1").await.is_ok());
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.parse().unwrap());
        headers
    }

    #[test]
    fn test_client_ip_uses_socket_by_default() {
        let state = RateLimitState::with_limits(2, Duration::from_secs(60));
        let peer = Some(SocketAddr::from(([192, 168, 1, 20], 51000)));

        assert_eq!(state.client_ip(&HeaderMap::new(), peer), "192.168.1.20");
        // Sin proxy de confianza la cabecera se ignora
        assert_eq!(state.client_ip(&forwarded("1.2.3.4"), peer), "192.168.1.20");
        assert_eq!(state.client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_client_ip_behind_trusted_proxy() {
        let state = RateLimitState::with_limits(2, Duration::from_secs(60)).trusting_proxy(true);
        let proxy = Some(SocketAddr::from(([10, 0, 0, 1], 443)));

        assert_eq!(state.client_ip(&forwarded("41.70.1.9, 10.0.0.1"), proxy), "41.70.1.9");
        assert_eq!(state.client_ip(&forwarded(" "), proxy), "10.0.0.1");
        assert_eq!(state.client_ip(&HeaderMap::new(), proxy), "10.0.0.1");
    }
}
