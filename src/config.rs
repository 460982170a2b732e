//! Deployment configuration, loaded from environment variables.
//!
//! Individual `std::env::var(...)` lookups with explicit defaults,
//! generalized into one struct built once at startup. There is no
//! generated-at-import-time fallback for secrets: a missing
//! `TICKET_ENCRYPTION_KEY` or `JWT_SECRET` is a startup failure, not a
//! warning.

use std::time::Duration;

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_pool_size: u32,

    pub bind_addr: String,

    pub jwt_secret: String,
    /// 32 raw bytes, hex-encoded, used as the AES-256-GCM key for signed
    /// ticket payloads. Deployment-provided; rotated out of band.
    pub ticket_encryption_key: [u8; 32],

    pub default_hold_ttl: Duration,

    /// IANA timezone name all fiscal boundaries are computed in.
    pub fiscal_timezone: String,

    pub log_dir: String,
    pub log_file: String,
    /// "never" | "daily" | "hourly"
    pub log_rotation: String,
    pub log_level: String,
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;

        let db_pool_size = std::env::var("PG_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 16 {
            bail!("JWT_SECRET must be at least 16 bytes");
        }

        let ticket_encryption_key = {
            let hex_key = std::env::var("TICKET_ENCRYPTION_KEY")
                .context("TICKET_ENCRYPTION_KEY must be set (deployment-provided, no generated fallback)")?;
            let bytes = hex::decode(hex_key.trim())
                .context("TICKET_ENCRYPTION_KEY must be hex-encoded")?;
            if bytes.len() != 32 {
                bail!(
                    "TICKET_ENCRYPTION_KEY must decode to 32 bytes (AES-256), got {}",
                    bytes.len()
                );
            }
            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes);
            key
        };

        let default_hold_ttl_secs: u64 = std::env::var("DEFAULT_HOLD_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);

        let fiscal_timezone =
            std::env::var("FISCAL_TIMEZONE").unwrap_or_else(|_| "America/Caracas".to_string());

        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let log_file = std::env::var("LOG_FILE").unwrap_or_else(|_| "ticketing.log".to_string());
        let log_rotation = std::env::var("LOG_ROTATION").unwrap_or_else(|_| "daily".to_string());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = std::env::var("LOG_JSON")
            .ok()
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            db_pool_size,
            bind_addr,
            jwt_secret,
            ticket_encryption_key,
            default_hold_ttl: Duration::from_secs(default_hold_ttl_secs),
            fiscal_timezone,
            log_dir,
            log_file,
            log_rotation,
            log_level,
            log_json,
        })
    }
}
