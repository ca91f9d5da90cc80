//! Runtime configuration, read once from the environment at startup.

use std::env;
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "bulk_uploads.sqlite";
const DEFAULT_SUBMISSION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DEMO_LATENCY_MS: u64 = 25;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Timeout applied to each individual remote call (campaign, ad set, ad).
    pub submission_timeout: Duration,
    /// Simulated latency of the demo submission client.
    pub demo_latency: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            host: env::var("BULK_UPLOAD_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env_parse("BULK_UPLOAD_PORT", DEFAULT_PORT),
            database_path: env::var("BULK_UPLOAD_DB")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            submission_timeout: Duration::from_secs(env_parse(
                "BULK_UPLOAD_SUBMISSION_TIMEOUT_SECS",
                DEFAULT_SUBMISSION_TIMEOUT_SECS,
            )),
            demo_latency: Duration::from_millis(env_parse(
                "BULK_UPLOAD_DEMO_LATENCY_MS",
                DEFAULT_DEMO_LATENCY_MS,
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
