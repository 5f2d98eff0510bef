//! CLI pool configuration.
//!
//! Startup parameters come from the command line; pool tuning comes from
//! environment variables with fallback to the pool defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use stockroom_core::{ClassifiedError, CoreResult, StoreConfig};
use stockroom_db::PoolConfig;

pub const MAX_CONNECTIONS_VAR: &str = "STOCKROOM_MAX_CONNECTIONS";
pub const ACQUIRE_TIMEOUT_VAR: &str = "STOCKROOM_ACQUIRE_TIMEOUT_SECS";
pub const STATEMENT_TIMEOUT_VAR: &str = "STOCKROOM_STATEMENT_TIMEOUT_SECS";

/// Builds the pool configuration from the process environment.
pub fn load(store: &StoreConfig) -> CoreResult<PoolConfig> {
    load_with(store, |name| env::var(name).ok())
}

/// Builds the pool configuration using `lookup` for overrides.
pub fn load_with<F>(store: &StoreConfig, lookup: F) -> CoreResult<PoolConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = PoolConfig::from(store);

    if let Some(max) = parse_var::<u32, _>(&lookup, MAX_CONNECTIONS_VAR)? {
        let min = config.min_connections.min(max);
        config = config.max_connections(max).min_connections(min);
    }

    if let Some(secs) = parse_var::<u64, _>(&lookup, ACQUIRE_TIMEOUT_VAR)? {
        config = config.acquire_timeout(Duration::from_secs(secs));
    }

    // 0 disables the statement deadline
    if let Some(secs) = parse_var::<u64, _>(&lookup, STATEMENT_TIMEOUT_VAR)? {
        config = config.statement_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }

    Ok(config)
}

fn parse_var<T, F>(lookup: &F, name: &str) -> CoreResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClassifiedError::argument(format!("Invalid value for {name}: '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn store() -> StoreConfig {
        StoreConfig::new("sqlite::memory:", "admin", "secret")
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = load_with(&store(), |_| None).unwrap();

        assert_eq!(config.url, "sqlite::memory:");
        assert_eq!(config.username, "admin");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.statement_timeout, None);
    }

    #[test]
    fn test_overrides_applied() {
        let env = vars(&[
            (MAX_CONNECTIONS_VAR, "4"),
            (ACQUIRE_TIMEOUT_VAR, "2"),
            (STATEMENT_TIMEOUT_VAR, "7"),
        ]);
        let config = load_with(&store(), |name| env.get(name).cloned()).unwrap();

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));
        assert_eq!(config.statement_timeout, Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_zero_statement_timeout_disables_deadline() {
        let env = vars(&[(STATEMENT_TIMEOUT_VAR, "0")]);
        let config = load_with(&store(), |name| env.get(name).cloned()).unwrap();

        assert_eq!(config.statement_timeout, None);
    }

    #[test]
    fn test_invalid_override_is_argument_error() {
        let env = vars(&[(MAX_CONNECTIONS_VAR, "lots")]);
        let err = load_with(&store(), |name| env.get(name).cloned()).unwrap_err();

        assert_eq!(err.code(), 1);
        assert!(err
            .details()
            .unwrap()
            .contains("STOCKROOM_MAX_CONNECTIONS"));
    }
}
