//! Error types for the engine binary.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gol_core::config::ConfigError,
    },

    /// The run ended with a fatal error.
    #[error("run failed: {source}")]
    Run {
        /// The underlying distributor error.
        #[from]
        source: gol_core::DistributorError,
    },

    /// A background task panicked or was cancelled.
    #[error("{task} task failed: {message}")]
    Task {
        /// Which task failed.
        task: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Wrap a join failure of the named task.
    pub fn task(task: &'static str, err: &tokio::task::JoinError) -> Self {
        Self::Task {
            task,
            message: err.to_string(),
        }
    }
}
