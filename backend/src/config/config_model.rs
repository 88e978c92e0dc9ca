use crate::config::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub payment_gateway: PaymentGateway,
    pub rate_limit: RateLimit,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    pub api_url: String,
    pub access_token: String,
    pub webhook_secret: String,
    pub notification_url: String,
    pub success_url: String,
    pub failure_url: String,
    pub webhook_tolerance_seconds: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub max_requests: i32,
    pub window_seconds: i64,
}
