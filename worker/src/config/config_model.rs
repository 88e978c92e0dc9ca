#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub sweeps: Sweeps,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Sweeps {
    /// `None` disables the internal sweep endpoints.
    pub internal_token: Option<String>,
    pub interval_seconds: u64,
    pub settlement_batch_limit: i64,
}
