mod alerts;
mod config;
mod layer;

use std::sync::Arc;

use alerts::{AlertDispatcher, WebhookAlertSink};
use anyhow::Result;
use config::ObservabilityConfig;
use layer::AlertLayer;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber: RUST_LOG-driven fmt output with local
/// timestamps, plus an optional alert webhook for errors.
///
/// Must be called from inside a tokio runtime when alerts are configured.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.alerts.as_ref() {
        Some(alerts) => {
            let sink = WebhookAlertSink::new(alerts.webhook_url.clone())?;
            let dispatcher =
                AlertDispatcher::spawn(config.service_context.clone(), vec![Arc::new(sink)]);
            Some(
                AlertLayer::new(dispatcher, alerts.min_level)
                    .with_filter(LevelFilter::from_level(alerts.min_level)),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(
            component = %config.service_context.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %config.service_context.service_name,
        environment = %config.service_context.environment,
        component = %config.service_context.component,
        alerts_enabled = config.alerts.is_some(),
        "observability: initialized"
    );

    Ok(())
}
