//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::UserId;
use engine::{GatePolicy, RouterConfig};

/// Bot configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `OPERATORS` — comma-separated privileged user ids (default: empty)
/// - `DATABASE_URL` — SQLite connection string; unset means in-memory
/// - `BROADCAST_DELAY_MS` — pause between broadcast deliveries (default: `40`)
/// - `BROADCAST_PROGRESS_EVERY` — progress-edit cadence (default: `10`)
/// - `STATE_IDLE_REAP_SECS` — idle conversation reap threshold; `0` disables (default: `0`)
/// - `GATE_POLICY` — `silent` or `notify` (default: `silent`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub operators: Vec<UserId>,
    pub database_url: Option<String>,
    pub broadcast_delay_ms: u64,
    pub broadcast_progress_every: usize,
    pub idle_reap_secs: u64,
    pub gate_policy: GatePolicy,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            operators: std::env::var("OPERATORS")
                .map(|v| parse_operators(&v))
                .unwrap_or_default(),
            database_url: std::env::var("DATABASE_URL").ok(),
            broadcast_delay_ms: std::env::var("BROADCAST_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(40),
            broadcast_progress_every: std::env::var("BROADCAST_PROGRESS_EVERY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            idle_reap_secs: std::env::var("STATE_IDLE_REAP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            gate_policy: std::env::var("GATE_POLICY")
                .map(|v| parse_gate_policy(&v))
                .unwrap_or_default(),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Builds the router configuration from the loaded values.
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            operators: self.operators.clone(),
            gate_policy: self.gate_policy,
            broadcast_delay: Duration::from_millis(self.broadcast_delay_ms),
            broadcast_progress_every: self.broadcast_progress_every,
            ..RouterConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operators: Vec::new(),
            database_url: None,
            broadcast_delay_ms: 40,
            broadcast_progress_every: 10,
            idle_reap_secs: 0,
            gate_policy: GatePolicy::Silent,
            log_level: "info".to_string(),
        }
    }
}

/// Parses a comma-separated operator id list, skipping malformed entries.
fn parse_operators(value: &str) -> Vec<UserId> {
    value
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .map(UserId::new)
        .collect()
}

fn parse_gate_policy(value: &str) -> GatePolicy {
    match value.trim().to_lowercase().as_str() {
        "notify" => GatePolicy::Notify,
        _ => GatePolicy::Silent,
    }
}
