use thiserror::Error;

/// Startup failures. These are the only errors allowed to end the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config line {line}: {content}")]
    Syntax { line: usize, content: String },
    #[error("config is missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("config key '{key}' has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("setup prompt aborted: {0}")]
    Prompt(String),
}

/// Failures talking to the presence or calendar service. Always scoped to a
/// single poll cycle.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Malformed(String),
}
