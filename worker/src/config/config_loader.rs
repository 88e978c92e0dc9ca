use super::config_model::{Database, DotEnvyConfig, Sweeps, WorkerServer};
use anyhow::{Context, Result, bail};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| lookup(key).with_context(|| format!("{key} is invalid"));

    let worker_server = WorkerServer {
        port: required("SERVER_PORT_WORKER")?
            .parse()
            .context("SERVER_PORT_WORKER is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let sweeps = Sweeps {
        internal_token: lookup("INTERNAL_SWEEP_TOKEN").and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
        interval_seconds: optional_positive(&lookup, "SWEEP_INTERVAL_SECONDS", 60)?,
        settlement_batch_limit: optional_positive(&lookup, "SETTLEMENT_BATCH_LIMIT", 50)?,
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        sweeps,
    })
}

fn optional_positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("{key} is invalid"))?;
            if value <= T::default() {
                bail!("{key} must be greater than zero");
            }
            Ok(value)
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        env(&[
            ("SERVER_PORT_WORKER", "8081"),
            ("SERVER_BODY_LIMIT", "2"),
            ("SERVER_TIMEOUT", "30"),
            ("DATABASE_URL", "postgres://localhost/barber"),
        ])
    }

    #[test]
    fn applies_defaults() {
        let vars = base();
        let config = load_from(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.worker_server.port, 8081);
        assert_eq!(config.sweeps.internal_token, None);
        assert_eq!(config.sweeps.interval_seconds, 60);
        assert_eq!(config.sweeps.settlement_batch_limit, 50);
    }

    #[test]
    fn blank_token_disables_internal_api() {
        let mut vars = base();
        vars.insert("INTERNAL_SWEEP_TOKEN".to_string(), "   ".to_string());
        vars.insert("SWEEP_INTERVAL_SECONDS".to_string(), "15".to_string());
        let config = load_from(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.sweeps.internal_token, None);
        assert_eq!(config.sweeps.interval_seconds, 15);
    }

    #[test]
    fn rejects_missing_and_non_positive_values() {
        let vars = env(&[("SERVER_PORT_WORKER", "8081")]);
        assert!(load_from(|key| vars.get(key).cloned()).is_err());

        let mut vars = base();
        vars.insert("SETTLEMENT_BATCH_LIMIT".to_string(), "0".to_string());
        let err = load_from(|key| vars.get(key).cloned()).unwrap_err();
        assert!(err.to_string().contains("SETTLEMENT_BATCH_LIMIT"));
    }
}
