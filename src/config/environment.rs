//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use super::database::DatabaseConfig;

/// Backend de almacenamiento de los repositorios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("STORE_BACKEND must be 'postgres' or 'memory', got '{}'", other)),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: String,
    pub store_backend: StoreBackend,
    pub database: DatabaseConfig,
    pub redis_url: Option<String>,
    pub route_cache_ttl: u64,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    /// Tomar la IP del cliente de `x-forwarded-for` (solo detrás de un proxy propio)
    pub trust_proxy: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            log_level: "debug".to_string(),
            store_backend: StoreBackend::Memory,
            database: DatabaseConfig::default(),
            redis_url: None,
            route_cache_ttl: 300,
            cors_origins: Vec::new(),
            rate_limit_requests: 30,
            rate_limit_window: 60,
            trust_proxy: false,
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración de las variables de entorno.
    ///
    /// Las variables ausentes toman el valor por defecto; un valor presente
    /// pero inválido es un error de arranque.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let default_log_level = if environment == "development" { "debug" } else { "info" };

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Postgres,
        };

        let database = match store_backend {
            StoreBackend::Postgres => DatabaseConfig::from_env()?,
            StoreBackend::Memory => DatabaseConfig::default(),
        };

        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level.to_string()),
            store_backend,
            database,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            route_cache_ttl: parse_var("ROUTE_CACHE_TTL", defaults.route_cache_ttl)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_requests: parse_var("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            rate_limit_window: parse_var("RATE_LIMIT_WINDOW", defaults.rate_limit_window)?,
            trust_proxy: parse_var("TRUST_PROXY", defaults.trust_proxy)?,
            environment,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Leer una variable tipada (número o booleano) con valor por defecto
pub(crate) fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", name, value)),
        Err(_) => Ok(default),
    }
}
