use thiserror::Error;

/// Failures raised while bringing infrastructure up or tearing it down.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database connection failed: {message}")]
    Connect { message: String },
    #[error("schema migration failed: {message}")]
    Migration { message: String },
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
    #[error("invalid configuration: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
