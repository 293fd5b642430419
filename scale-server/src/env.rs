use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const DB_USERNAME_VAR: &str = "SCALE_DB_USERNAME";
const DB_PASSWORD_VAR: &str = "SCALE_DB_PASSWORD";
const DB_HOSTNAME_VAR: &str = "SCALE_DB_HOSTNAME";
const DB_PORT_VAR: &str = "SCALE_DB_PORT";
const DB_NAME_VAR: &str = "SCALE_DB_NAME";
const DB_MAX_CONNECTIONS_VAR: &str = "SCALE_DB_MAX_CONNECTIONS";
const DB_IDLE_TIMEOUT_SECS_VAR: &str = "SCALE_DB_IDLE_TIMEOUT_SECS";

const TOKEN_SIGNING_KEY_VAR: &str = "SCALE_TOKEN_SIGNING_KEY_B64";
const AUTH_COOKIE_NAME_VAR: &str = "SCALE_AUTH_COOKIE_NAME";
const AUTH_TOKEN_LIFETIME_DAYS_VAR: &str = "SCALE_AUTH_TOKEN_LIFETIME_DAYS";

const ACTIX_WORKER_COUNT_VAR: &str = "SCALE_ACTIX_WORKER_COUNT";
const MAX_BODY_BYTES_VAR: &str = "SCALE_MAX_BODY_BYTES";

const LOG_LEVEL_VAR: &str = "SCALE_LOG_LEVEL";

const MIN_TOKEN_SIGNING_KEY_SIZE: usize = 32;
const MAX_AUTH_TOKEN_LIFETIME_DAYS: u64 = 36500;
const SECONDS_PER_DAY: u64 = 86400;

/// Read once at startup and handed out to whatever needs it. Secrets are wiped when the
/// config is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Config {
    pub db_username: String,
    pub db_password: String,
    pub db_hostname: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_max_connections: u32,
    #[zeroize(skip)]
    pub db_idle_timeout: Duration,

    pub token_signing_key: Vec<u8>,
    pub auth_cookie_name: String,
    #[zeroize(skip)]
    pub auth_token_lifetime: Duration,

    pub actix_worker_count: usize,
    pub max_body_bytes: usize,

    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let token_signing_key =
            decode_signing_key(&Zeroizing::new(env_var::<String>(TOKEN_SIGNING_KEY_VAR)?))?;

        Ok(Config {
            db_username: env_var(DB_USERNAME_VAR)?,
            db_password: env_var(DB_PASSWORD_VAR)?,
            db_hostname: env_var(DB_HOSTNAME_VAR)?,
            db_port: env_var(DB_PORT_VAR)?,
            db_name: env_var(DB_NAME_VAR)?,
            db_max_connections: env_var_or(DB_MAX_CONNECTIONS_VAR, 48),
            db_idle_timeout: Duration::from_secs(env_var_or(DB_IDLE_TIMEOUT_SECS_VAR, 30)),

            token_signing_key,
            auth_cookie_name: env_var_or(AUTH_COOKIE_NAME_VAR, String::from("AuthToken")),
            auth_token_lifetime: token_lifetime(env_var_or_default(
                AUTH_TOKEN_LIFETIME_DAYS_VAR,
                365,
            )?)?,

            actix_worker_count: env_var_or(ACTIX_WORKER_COUNT_VAR, num_cpus::get()),
            max_body_bytes: env_var_or(MAX_BODY_BYTES_VAR, 65536),

            log_level: env_var_or(LOG_LEVEL_VAR, String::from("info")),
        })
    }

    pub fn database_uri(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_username, self.db_password, self.db_hostname, self.db_port, self.db_name,
        ))
    }
}

fn decode_signing_key(key_b64: &str) -> Result<Vec<u8>, ConfigError> {
    let key = b64
        .decode(key_b64.trim().as_bytes())
        .map_err(|_| ConfigError::invalid(TOKEN_SIGNING_KEY_VAR))?;

    if key.len() < MIN_TOKEN_SIGNING_KEY_SIZE {
        return Err(ConfigError::invalid(TOKEN_SIGNING_KEY_VAR));
    }

    Ok(key)
}

fn token_lifetime(days: u64) -> Result<Duration, ConfigError> {
    if days == 0 || days > MAX_AUTH_TOKEN_LIFETIME_DAYS {
        return Err(ConfigError::invalid(AUTH_TOKEN_LIFETIME_DAYS_VAR));
    }

    days.checked_mul(SECONDS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or(ConfigError::invalid(AUTH_TOKEN_LIFETIME_DAYS_VAR))
}

fn env_var<T: FromStr>(key: &'static str) -> Result<T, ConfigError> {
    let var = std::env::var(key).map_err(|_| ConfigError::missing(key))?;
    let var: T = var.parse().map_err(|_| ConfigError::invalid(key))?;
    Ok(var)
}

// Unlike `env_var_or`, a value that is set but unparseable is an error
fn env_var_or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(var) => var.parse().map_err(|_| ConfigError::invalid(key)),
        Err(_) => Ok(default),
    }
}

fn env_var_or<T: FromStr>(key: &'static str, default: T) -> T {
    let Ok(var) = std::env::var(key) else {
        return default;
    };

    var.parse().unwrap_or(default)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar(&'static str),
}

impl ConfigError {
    fn missing(var_name: &'static str) -> Self {
        Self::MissingVar(var_name)
    }

    fn invalid(var_name: &'static str) -> Self {
        Self::InvalidVar(var_name)
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(key) => write!(f, "Missing environment variable '{}'", key),
            Self::InvalidVar(key) => write!(f, "Environment variable '{}' is invalid", key),
        }
    }
}
