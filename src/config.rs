use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    /// Shared secret for the dashboard. Empty disables admin access.
    pub admin_token: String,
    /// Path prefixes exempt from the admission gate.
    pub static_prefixes: Vec<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            admin_token: var("ADMIN_TOKEN").unwrap_or_default(),
            static_prefixes: try_load::<String>(
                "STATIC_PREFIXES",
                "/assets,/images,/favicon.ico",
            )
            .split(',')
            .map(str::to_string)
            .collect(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
