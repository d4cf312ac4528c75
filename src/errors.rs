use thiserror::Error;

/// Problems with the operator-supplied configuration.
///
/// Always raised before any storage call is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no bucket given (pass --bucket or set ROTATE_BUCKET)")]
    MissingBucket,
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("key prefix must not be empty")]
    EmptyPrefix,
    #[error("parsing {var} value `{value}`: {reason}")]
    InvalidEnvValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("reading {var}: {source}")]
    UnreadableEnv {
        var: &'static str,
        #[source]
        source: std::env::VarError,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
