//! Tracing setup
//!
//! Diagnostics go to stderr so command output on stdout stays clean.
//!
//! # Environment Variables
//!
//! - `WARDEN_LOG`: filter directives (default: `warn`), e.g. `warden_core=debug`
//! - `WARDEN_LOG_FORMAT`: `json` for structured output, anything else for compact text

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn";

pub fn init() {
    let log_format = std::env::var("WARDEN_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter =
        EnvFilter::try_from_env("WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
