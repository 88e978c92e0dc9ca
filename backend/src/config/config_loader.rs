use anyhow::{Context, Result};
use crates::payments::mercado_pago_client::DEFAULT_API_URL;

use super::{
    config_model::{BackendServer, Database, DotEnvyConfig, PaymentGateway, RateLimit, Supabase},
    stage::Stage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
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

    let supabase = Supabase {
        jwt_secret: get_supabase_jwt_secret()?,
    };

    let payment_gateway = PaymentGateway {
        api_url: std::env::var("PAYMENT_GATEWAY_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        access_token: required("PAYMENT_GATEWAY_ACCESS_TOKEN")?,
        webhook_secret: required("PAYMENT_GATEWAY_WEBHOOK_SECRET")?,
        notification_url: required("PAYMENT_NOTIFICATION_URL")?,
        success_url: required("PAYMENT_SUCCESS_URL")?,
        failure_url: required("PAYMENT_FAILURE_URL")?,
        webhook_tolerance_seconds: optional_positive("WEBHOOK_TOLERANCE_SECONDS", 300)?,
    };

    let rate_limit = RateLimit {
        max_requests: optional_positive("RATE_LIMIT_MAX_REQUESTS", 30)?,
        window_seconds: optional_positive("RATE_LIMIT_WINDOW_SECONDS", 60)?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        payment_gateway,
        rate_limit,
        stage: get_stage(),
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or_default();
    Stage::try_from(&stage_str).unwrap_or_default()
}

pub fn get_supabase_jwt_secret() -> Result<String> {
    dotenvy::dotenv().ok();
    required("SUPABASE_JWT_SECRET")
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is invalid"))
}

fn optional_positive<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("{key} is invalid"))?;
            if value <= T::default() {
                anyhow::bail!("{key} must be greater than zero");
            }
            Ok(value)
        }
        _ => Ok(default),
    }
}
