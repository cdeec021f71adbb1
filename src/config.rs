use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Secret used when running locally without SESSION_SECRET.
const DEV_SESSION_SECRET: &str = "feastride-development-session-secret-change-me";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Session and one-time password settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl_secs: i64,
    pub otp_ttl_secs: i64,
    pub otp_length: u32,
    /// Return the OTP in the login response. Only honoured in development.
    pub otp_echo: bool,
}

/// Ride fare parameters
#[derive(Debug, Clone)]
pub struct FareConfig {
    pub base: Decimal,
    pub per_km: Decimal,
    pub per_minute: Decimal,
    pub minimum: Decimal,
    pub average_speed_kmh: f64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub fare: FareConfig,
    pub log_level: String,
    pub http_port: u16,
    pub environment: String,
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;

        let config = Self {
            url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            acquire_timeout_secs: parse_var("DATABASE_ACQUIRE_TIMEOUT_SECS").unwrap_or(30),
            idle_timeout_secs: parse_var("DATABASE_IDLE_TIMEOUT_SECS").unwrap_or(600), // 10 minutes
            max_lifetime_secs: parse_var("DATABASE_MAX_LIFETIME_SECS").unwrap_or(1800), // 30 minutes
            test_before_acquire: parse_var("DATABASE_TEST_BEFORE_ACQUIRE").unwrap_or(true),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }
        if self.acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/feastride".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl AuthConfig {
    /// Create auth config from environment variables.
    ///
    /// `SESSION_SECRET` may only be omitted in development.
    pub fn from_env(environment: &str) -> Result<Self, String> {
        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "development" => DEV_SESSION_SECRET.to_string(),
            Err(_) => return Err("SESSION_SECRET is required outside development".to_string()),
        };

        let config = Self {
            session_secret,
            session_ttl_secs: parse_var("SESSION_TTL_SECS").unwrap_or(24 * 60 * 60),
            otp_ttl_secs: parse_var("OTP_TTL_SECS").unwrap_or(300),
            otp_length: parse_var("OTP_LENGTH").unwrap_or(6),
            otp_echo: parse_var("OTP_ECHO").unwrap_or(false) && environment == "development",
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.session_secret.len() < 32 {
            return Err("SESSION_SECRET must be at least 32 bytes".to_string());
        }
        if self.session_ttl_secs <= 0 {
            return Err("SESSION_TTL_SECS must be greater than 0".to_string());
        }
        if self.otp_ttl_secs <= 0 {
            return Err("OTP_TTL_SECS must be greater than 0".to_string());
        }
        if !(4..=8).contains(&self.otp_length) {
            return Err(format!("OTP_LENGTH must be between 4 and 8, got {}", self.otp_length));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_ttl_secs: 24 * 60 * 60,
            otp_ttl_secs: 300,
            otp_length: 6,
            otp_echo: false,
        }
    }
}

impl FareConfig {
    /// Create fare config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let config = Self {
            base: parse_var("FARE_BASE").unwrap_or(defaults.base),
            per_km: parse_var("FARE_PER_KM").unwrap_or(defaults.per_km),
            per_minute: parse_var("FARE_PER_MINUTE").unwrap_or(defaults.per_minute),
            minimum: parse_var("FARE_MINIMUM").unwrap_or(defaults.minimum),
            average_speed_kmh: parse_var("FARE_AVERAGE_SPEED_KMH")
                .unwrap_or(defaults.average_speed_kmh),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("FARE_BASE", self.base),
            ("FARE_PER_KM", self.per_km),
            ("FARE_PER_MINUTE", self.per_minute),
            ("FARE_MINIMUM", self.minimum),
        ] {
            if value.is_sign_negative() {
                return Err(format!("{} must not be negative", name));
            }
        }
        if !(self.average_speed_kmh > 0.0) {
            return Err("FARE_AVERAGE_SPEED_KMH must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base: Decimal::new(250, 2),
            per_km: Decimal::new(120, 2),
            per_minute: Decimal::new(25, 2),
            minimum: Decimal::new(500, 2),
            average_speed_kmh: 30.0,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let http_port = parse_var("HTTP_PORT").unwrap_or(8080);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        let environment = environment.to_lowercase();
        if !valid_environments.contains(&environment.as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let auth = AuthConfig::from_env(&environment)?;
        let fare = FareConfig::from_env()?;

        Ok(Self {
            database,
            auth,
            fare,
            log_level: log_level.to_lowercase(),
            http_port,
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            fare: FareConfig::default(),
            log_level: "info".to_string(),
            http_port: 8080,
            environment: "development".to_string(),
        }
    }
}
