use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::routing::DEFAULT_FALLBACK_SPEED_MPS;

pub const DEFAULT_USER_AGENT: &str = "RideApp/1.0 (educational demo)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub geocoder_base_url: String,
    pub router_base_url: String,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub search_debounce: Duration,
    pub geolocation_timeout: Duration,
    pub fallback_speed_mps: f64,
    pub ride_queue_size: usize,
    pub event_buffer_size: usize,
    pub session_idle_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other}, expected compact or json"
                )));
            }
        };

        let fallback_speed_mps: f64 = parse_or_default("FALLBACK_SPEED_MPS", DEFAULT_FALLBACK_SPEED_MPS)?;
        if !fallback_speed_mps.is_finite() || fallback_speed_mps <= 0.0 {
            return Err(AppError::Internal(format!(
                "invalid FALLBACK_SPEED_MPS: {fallback_speed_mps} must be > 0"
            )));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            router_base_url: env::var("ROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            user_agent: env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            http_timeout: Duration::from_secs(parse_or_default("HTTP_TIMEOUT_SECS", 10)?),
            search_debounce: Duration::from_millis(parse_or_default("SEARCH_DEBOUNCE_MS", 300)?),
            geolocation_timeout: Duration::from_secs(parse_or_default(
                "GEOLOCATION_TIMEOUT_SECS",
                8,
            )?),
            fallback_speed_mps,
            ride_queue_size: non_zero("RIDE_QUEUE_SIZE", parse_or_default("RIDE_QUEUE_SIZE", 1024)?)?,
            event_buffer_size: non_zero(
                "EVENT_BUFFER_SIZE",
                parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            )?,
            session_idle_ttl: Duration::from_secs(non_zero(
                "SESSION_IDLE_TTL_SECS",
                parse_or_default("SESSION_IDLE_TTL_SECS", 1800)?,
            )?),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

/// Channel capacities and intervals of zero are rejected at startup.
fn non_zero<T>(key: &str, value: T) -> Result<T, AppError>
where
    T: PartialEq + Default + std::fmt::Display,
{
    if value == T::default() {
        return Err(AppError::Internal(format!("invalid {key}: {value} must be > 0")));
    }
    Ok(value)
}
