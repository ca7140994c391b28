use std::{path::PathBuf, time::Duration};

/// Failure shapes a [`ChannelGateway`](crate::ports::ChannelGateway) may report.
///
/// Both are retryable, under different policies: rate limits are waited out for
/// exactly the duration the platform signals, platform errors get the evaluator's
/// bounded retry budget.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("platform error: {message}")]
    Platform { message: String },
}

impl GatewayError {
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

/// Outcome of a bounded retry loop that did not succeed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// Passed through untouched so the scanner can wait and re-attempt the channel.
    #[error("rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("gave up after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },
}

/// Core error type.
///
/// Adapter crates map their transport errors into [`GatewayError`]; everything
/// else that can stop a run ends up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read policy file {path}: {source}")]
    PolicyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The platform-signaled wait, if this error is a rate limit.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Gateway(GatewayError::RateLimited { retry_after })
            | Error::Evaluation(EvaluationError::RateLimited { retry_after }) => {
                Some(*retry_after)
            }
            _ => None,
        }
    }
}
