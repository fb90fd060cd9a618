use thiserror::Error;

/// Top-level error for the agent binary. Each variant maps to one of the
/// three process exit codes `main` returns: configuration problems are 2,
/// everything else that escapes a cycle's own failure boundary is 1.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("scanner error: {0}")]
    Scanner(#[from] weather_scanner::ScannerError),

    #[error("executor error: {0}")]
    Executor(#[from] weather_executor::ExecutorError),

    #[error("monitor error: {0}")]
    Monitor(#[from] weather_monitor::MonitorError),

    #[error("resolver error: {0}")]
    Resolver(#[from] weather_resolver::ResolverError),

    #[error("storage error: {0}")]
    Storage(#[from] weather_storage::StorageError),

    #[error("platform error: {0}")]
    Platform(#[from] weather_platform::PlatformError),

    #[error("forecast error: {0}")]
    Forecast(#[from] weather_forecast::ForecastError),

    #[error("signal error: {0}")]
    Signal(#[from] std::io::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    /// Exit code contract: 0 success (never constructed), 1 fatal runtime
    /// error, 2 configuration error. Only `Config` is a startup-time
    /// failure; every other variant reaching `main` means a command
    /// (`scan`/`status`/`resolve`) failed outright rather than being
    /// isolated inside a running cycle.
    pub fn exit_code(&self) -> i32 {
        match self {
            AgentError::Config(_) => 2,
            _ => 1,
        }
    }
}
