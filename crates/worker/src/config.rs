use std::path::PathBuf;
use std::time::Duration;

use helpdesk_core::scripting::powershell::DEFAULT_POWERSHELL_HOST;

/// Errors raised while reading worker configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// How often each job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobIntervals {
    pub server_status: Duration,
    pub locked_out_users: Duration,
    pub domain_topology: Duration,
    pub controller_liveness: Duration,
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Directory holding the snapshot scripts.
    pub script_dir: PathBuf,
    /// PowerShell host binary (`pwsh` or `powershell.exe`).
    pub powershell_host: String,
    /// Upper bound on a single snapshot script run.
    pub script_timeout: Duration,
    pub intervals: JobIntervals,
    /// TCP port probed on each domain controller (LDAP by default).
    pub probe_port: u16,
    pub probe_timeout: Duration,
    /// Maximum controllers probed at once.
    pub probe_concurrency: usize,
    /// How long shutdown waits for in-flight runs.
    pub shutdown_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                        | Default      |
    /// |--------------------------------|--------------|
    /// | `DATABASE_URL`                 | (required)   |
    /// | `DB_MAX_CONNECTIONS`           | `10`         |
    /// | `SCRIPT_DIR`                   | `./scripts`  |
    /// | `POWERSHELL_HOST`              | `pwsh`       |
    /// | `SCRIPT_TIMEOUT_SECS`          | `120`        |
    /// | `SERVER_STATUS_INTERVAL`       | `5m`         |
    /// | `LOCKED_OUT_INTERVAL`          | `1m`         |
    /// | `DOMAIN_TOPOLOGY_INTERVAL`     | `1d`         |
    /// | `CONTROLLER_LIVENESS_INTERVAL` | `2m`         |
    /// | `PROBE_PORT`                   | `389`        |
    /// | `PROBE_TIMEOUT_SECS`           | `5`          |
    /// | `PROBE_CONCURRENCY`            | `8`          |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let intervals = JobIntervals {
            server_status: interval_var(&lookup, "SERVER_STATUS_INTERVAL", "5m")?,
            locked_out_users: interval_var(&lookup, "LOCKED_OUT_INTERVAL", "1m")?,
            domain_topology: interval_var(&lookup, "DOMAIN_TOPOLOGY_INTERVAL", "1d")?,
            controller_liveness: interval_var(&lookup, "CONTROLLER_LIVENESS_INTERVAL", "2m")?,
        };

        let probe_concurrency: usize = parse_var(&lookup, "PROBE_CONCURRENCY", "8")?;
        if probe_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "PROBE_CONCURRENCY",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            database_url,
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", "10")?,
            script_dir: PathBuf::from(lookup("SCRIPT_DIR").unwrap_or_else(|| "./scripts".into())),
            powershell_host: lookup("POWERSHELL_HOST")
                .unwrap_or_else(|| DEFAULT_POWERSHELL_HOST.into()),
            script_timeout: Duration::from_secs(parse_var(&lookup, "SCRIPT_TIMEOUT_SECS", "120")?),
            intervals,
            probe_port: parse_var(&lookup, "PROBE_PORT", "389")?,
            probe_timeout: Duration::from_secs(parse_var(&lookup, "PROBE_TIMEOUT_SECS", "5")?),
            probe_concurrency,
            shutdown_timeout: Duration::from_secs(parse_var(
                &lookup,
                "SHUTDOWN_TIMEOUT_SECS",
                "30",
            )?),
        })
    }
}

/// Parse an interval such as `15m`, `2h` or `1d`. A bare number is minutes.
pub fn parse_interval(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last() {
        Some((idx, 'm' | 'M')) => (&raw[..idx], 60),
        Some((idx, 'h' | 'H')) => (&raw[..idx], 60 * 60),
        Some((idx, 'd' | 'D')) => (&raw[..idx], 24 * 60 * 60),
        Some((_, c)) if c.is_ascii_digit() => (raw, 60),
        _ => return Err("expected <n>m, <n>h or <n>d".into()),
    };
    let count: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("{digits:?} is not a whole number"))?;
    if count == 0 {
        return Err("interval must be greater than zero".into());
    }
    count
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| "interval is too large".into())
}

fn interval_var<F>(lookup: &F, key: &'static str, default: &str) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    parse_interval(&value).map_err(|reason| ConfigError::Invalid { key, value, reason })
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
