//! Tracing setup for the CLI.
//!
//! `COMPANION_LOG` holds the filter directives (default `info`) and
//! `COMPANION_LOG_FORMAT=json` switches to structured output. Logs go to
//! stderr so command output stays pipeable.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "COMPANION_LOG";
pub const LOG_FORMAT_ENV: &str = "COMPANION_LOG_FORMAT";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
