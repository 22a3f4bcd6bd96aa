//! Script to mint a session token for local use.
//!
//! Usage: `issue_token [--subject <uuid>] [--ttl-hours N]` (default: random
//! subject, 24 hours). Signs with `JWT_SECRET` and prints the token to stdout.

use chrono::Duration;
use dotenvy::dotenv;
use std::env;
use uuid::Uuid;

use lead_manager::auth::issue_token;
use lead_manager::config::Config;

const DEFAULT_TTL_HOURS: i64 = 24;

fn flag_value<'a>(args: &'a [String], flag: &str) -> anyhow::Result<Option<&'a str>> {
    match args.iter().position(|arg| arg == flag) {
        Some(index) => args
            .get(index + 1)
            .map(|raw| Some(raw.as_str()))
            .ok_or_else(|| anyhow::anyhow!("{} expects a value", flag)),
        None => Ok(None),
    }
}

fn parse_subject(args: &[String]) -> anyhow::Result<Uuid> {
    match flag_value(args, "--subject")? {
        Some(raw) => Uuid::parse_str(raw)
            .map_err(|e| anyhow::anyhow!("--subject expects a UUID: {}", e)),
        None => Ok(Uuid::new_v4()),
    }
}

fn parse_ttl_hours(args: &[String]) -> anyhow::Result<i64> {
    match flag_value(args, "--ttl-hours")? {
        Some(raw) => raw
            .parse()
            .ok()
            .filter(|hours: &i64| *hours > 0)
            .ok_or_else(|| anyhow::anyhow!("--ttl-hours expects a positive number")),
        None => Ok(DEFAULT_TTL_HOURS),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().collect();
    let subject = parse_subject(&args)?;
    let ttl_hours = parse_ttl_hours(&args)?;

    let config = Config::from_env()?;
    let token = issue_token(&config.jwt_secret, subject, Duration::hours(ttl_hours))?;

    tracing::info!("Issued token for {} valid {}h", subject, ttl_hours);
    println!("{}", token);

    Ok(())
}
