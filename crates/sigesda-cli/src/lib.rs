use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use sigesda_core::models::{Actor, Role};
use uuid::Uuid;

/// Parse a timestamp given on the command line.
///
/// Accepts RFC 3339 (`2026-03-02T10:00:00-03:00`) or a naive
/// `YYYY-MM-DD HH:MM` / `YYYY-MM-DDTHH:MM`, which is taken as UTC.
pub fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Invalid timestamp '{}'", value))
}

/// Build the acting user from the global `--user`/`--role` flags.
pub fn actor_from_flags(user: Option<Uuid>, role: Option<Role>) -> anyhow::Result<Actor> {
    let user = user.context("--user is required for this command")?;
    let role = role.context("--role is required for this command")?;
    Ok(Actor::new(user, role))
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
