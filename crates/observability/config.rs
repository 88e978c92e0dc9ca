use std::env;

use tracing::Level;
use url::Url;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AlertSinkConfig {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) alerts: Option<AlertSinkConfig>,
    /// Logged once tracing is up.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(component: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let component = component.trim().to_string();
        let service_context = ServiceContext {
            service_name: non_empty("SERVICE_NAME").unwrap_or_else(|| component.clone()),
            environment: non_empty("STAGE").unwrap_or_else(|| "local".to_string()),
            component,
        };

        let mut warnings = Vec::new();
        let alerts = match non_empty("ALERT_WEBHOOK_URL") {
            None => None,
            Some(raw) => match Url::parse(&raw) {
                Ok(webhook_url) => Some(AlertSinkConfig {
                    webhook_url,
                    min_level: alert_level(non_empty("ALERT_MIN_LEVEL"), &mut warnings),
                }),
                Err(err) => {
                    // The URL itself carries a secret, only the parse error is reported.
                    warnings.push(format!(
                        "ALERT_WEBHOOK_URL is invalid; alerts disabled (parse error: {err})"
                    ));
                    None
                }
            },
        };

        Self {
            service_context,
            alerts,
            warnings,
        }
    }
}

fn alert_level(raw: Option<String>, warnings: &mut Vec<String>) -> Level {
    let Some(raw) = raw else {
        return Level::ERROR;
    };
    match raw.to_ascii_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "info" => Level::INFO,
        _ => {
            warnings.push(format!(
                "ALERT_MIN_LEVEL has unsupported value {raw}; using error"
            ));
            Level::ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilityConfig::from_lookup("backend", move |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_alert_sink() {
        let config = config(&[]);
        assert_eq!(config.service_context.service_name, "backend");
        assert_eq!(config.service_context.environment, "local");
        assert!(config.alerts.is_none());
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn alert_sink_with_custom_level() {
        let config = config(&[
            ("ALERT_WEBHOOK_URL", "https://hooks.example.com/abc"),
            ("ALERT_MIN_LEVEL", "WARN"),
            ("STAGE", "production"),
        ]);
        let alerts = config.alerts.unwrap();
        assert_eq!(alerts.min_level, Level::WARN);
        assert_eq!(config.service_context.environment, "production");
    }

    #[test]
    fn invalid_values_produce_warnings() {
        let config = config(&[("ALERT_WEBHOOK_URL", "not a url")]);
        assert!(config.alerts.is_none());
        assert_eq!(config.warnings.len(), 1);

        let config = config_with_level("loud");
        assert_eq!(config.alerts.unwrap().min_level, Level::ERROR);
        assert_eq!(config.warnings.len(), 1);
    }

    fn config_with_level(level: &str) -> ObservabilityConfig {
        config(&[
            ("ALERT_WEBHOOK_URL", "https://hooks.example.com/abc"),
            ("ALERT_MIN_LEVEL", level),
        ])
    }
}
