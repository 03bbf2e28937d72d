//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

/// Backend de datos seleccionado con `STORE_BACKEND`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("Unknown STORE_BACKEND '{}' (expected postgres|memory)", other)),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub mapbox_token: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub live_poll_interval: Duration,
    pub live_debounce: Duration,
    pub utc_offset_hours: i32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            jwt_secret: "development-secret-change-me".to_string(),
            jwt_expiration: 86_400,
            cors_origins: vec!["http://localhost:5173".to_string()],
            mapbox_token: None,
            supabase_url: None,
            supabase_anon_key: None,
            store_backend: StoreBackend::Memory,
            database_url: None,
            redis_url: None,
            live_poll_interval: Duration::from_millis(1000),
            live_debounce: Duration::from_millis(300),
            utc_offset_hours: 8,
        }
    }
}

// Variable opcional: ausente -> default con log, mal formada -> error
fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} must be valid: {}", key, e)),
        Err(_) => {
            log::info!("ℹ️ {} no definido, usando {:?}", key, default);
            Ok(default)
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl EnvironmentConfig {
    /// Lee la configuración desde las variables de entorno (tras `dotenvy`)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environment = optional("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = match optional("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => bail!("JWT_SECRET must be set in production"),
            None => {
                log::warn!("⚠️ JWT_SECRET no definido, usando secreto de desarrollo");
                defaults.jwt_secret
            }
        };

        let store_backend: StoreBackend = parse_or("STORE_BACKEND", StoreBackend::Postgres)
            .context("Invalid STORE_BACKEND")?;
        let database_url = optional("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }

        let cors_origins = optional("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            environment,
            port: parse_or("PORT", defaults.port)?,
            host: optional("HOST").unwrap_or(defaults.host),
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", defaults.jwt_expiration)?,
            cors_origins,
            mapbox_token: optional("MAPBOX_TOKEN"),
            supabase_url: optional("SUPABASE_URL"),
            supabase_anon_key: optional("SUPABASE_ANON_KEY"),
            store_backend,
            database_url,
            redis_url: optional("REDIS_URL"),
            live_poll_interval: Duration::from_millis(parse_or("LIVE_POLL_INTERVAL_MS", 1000u64)?),
            live_debounce: Duration::from_millis(parse_or("LIVE_DEBOUNCE_MS", 300u64)?),
            utc_offset_hours: parse_or("DASHBOARD_UTC_OFFSET_HOURS", defaults.utc_offset_hours)?,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parses() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" Postgres ".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_defaults_match_dashboard_timings() {
        let config = EnvironmentConfig::default();
        assert_eq!(config.live_poll_interval, Duration::from_millis(1000));
        assert_eq!(config.live_debounce, Duration::from_millis(300));
        assert_eq!(config.utc_offset_hours, 8);
        assert_eq!(config.server_url(), "0.0.0.0:3000");
    }
}
